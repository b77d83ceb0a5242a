//! Job viewer controller
//!
//! Ties the status poller, the progress estimate, and the 3D viewer together.
//! The host calls `update` once per frame; every timer and every network result
//! is applied from there.

use std::time::Duration;

use genview_assets::AssetFetcher;
use genview_core::{FrameClock, Vec2};
use genview_jobs::{Job, JobApi, JobPoller, JobStatus, PollerState, ProgressEstimator};
use genview_render::{ListenerId, Surface, Viewer, ViewerSource, ViewerStatus};
use tracing::{debug, info};

use crate::settings::Settings;
use crate::state::{Display, DisplayState, ModelStage};

pub struct ViewerController<A, F> {
    clock: FrameClock,
    poller: JobPoller<A>,
    estimator: ProgressEstimator,
    viewer: Viewer<F>,
}

impl<A: JobApi, F: AssetFetcher> ViewerController<A, F> {
    pub fn new(api: A, fetcher: F, settings: &Settings) -> Self {
        let mut viewer = Viewer::new(fetcher, settings.viewer.clone());
        viewer.set_source(Some(ViewerSource::Placeholder));
        Self {
            clock: FrameClock::new(),
            poller: JobPoller::new(api, settings.poller.clone()),
            estimator: ProgressEstimator::new(settings.estimator.clone()),
            viewer,
        }
    }

    /// Track `job_id`, discarding everything known about the previous job.
    /// The old session is torn down before anything for the new job is built.
    pub fn start_tracking(&mut self, job_id: impl Into<String>) {
        let job_id = job_id.into();
        self.poller.stop();
        self.estimator.reset();
        self.viewer.set_source(None);
        self.poller.start(job_id, self.clock.now());
        self.sync_viewer();
    }

    /// Stop tracking and go back to the placeholder
    pub fn stop_tracking(&mut self) {
        self.poller.stop();
        self.estimator.reset();
        self.sync_viewer();
    }

    pub fn current_job(&self) -> Option<&Job> {
        self.poller.job()
    }

    /// Estimated percentage for the tracked job
    pub fn current_progress(&self) -> u32 {
        self.estimator.percent()
    }

    pub fn job_id(&self) -> Option<&str> {
        self.poller.job_id()
    }

    /// Open the cancel confirmation. Returns false when the job cannot be cancelled.
    pub fn request_cancel(&mut self) -> bool {
        self.poller.request_cancel()
    }

    pub fn dismiss_cancel(&mut self) {
        self.poller.dismiss_cancel();
    }

    /// Cancel the job after confirmation. The job reads as cancelled immediately.
    pub fn confirm_cancel(&mut self) -> bool {
        if !self.poller.confirm_cancel() {
            return false;
        }
        self.observe_job();
        self.sync_viewer();
        true
    }

    pub fn set_zoom(&mut self, percent: u32) {
        self.viewer.set_zoom(percent);
    }

    pub fn zoom(&self) -> u32 {
        self.viewer.zoom()
    }

    /// Called with the settled zoom after user interaction
    pub fn on_zoom_change(&mut self, listener: impl FnMut(u32) + 'static) -> ListenerId {
        self.viewer.on_zoom_change(listener)
    }

    pub fn remove_zoom_listener(&mut self, id: ListenerId) -> bool {
        self.viewer.remove_zoom_listener(id)
    }

    pub fn mount(&mut self, surface: Box<dyn Surface>) {
        self.viewer.mount(surface);
    }

    pub fn unmount(&mut self) {
        self.viewer.unmount();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewer.resize(width, height);
    }

    pub fn orbit(&mut self, delta: Vec2) {
        self.viewer.orbit(delta);
    }

    pub fn scroll(&mut self, steps: f32) {
        self.viewer.scroll(steps);
    }

    /// Advance one frame
    pub fn update(&mut self, delta: Duration) {
        self.clock.update(delta);
        let now = self.clock.now();

        self.poller.update(now);
        self.observe_job();
        self.estimator.advance(delta);
        self.sync_viewer();
        self.viewer.frame(now);
    }

    /// The job reached a terminal state and the viewer has nothing left to load
    pub fn is_settled(&self) -> bool {
        self.poller.state() == PollerState::Terminal && !self.viewer.status().is_loading()
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn viewer(&self) -> &Viewer<F> {
        &self.viewer
    }

    pub fn poller(&self) -> &JobPoller<A> {
        &self.poller
    }

    fn observe_job(&mut self) {
        if let (Some(job_id), Some(job)) = (self.poller.job_id(), self.poller.job()) {
            self.estimator.observe(job_id, job.status);
        }
    }

    fn desired_source(&self) -> Option<ViewerSource> {
        match self.poller.state() {
            PollerState::Idle => Some(ViewerSource::Placeholder),
            PollerState::Tracking => None,
            PollerState::Terminal => self
                .poller
                .job()
                .and_then(|job| self.poller.api().asset_url(job))
                .map(ViewerSource::Asset),
        }
    }

    fn sync_viewer(&mut self) {
        let source = self.desired_source();
        if self.viewer.source() == source.as_ref() {
            return;
        }
        match &source {
            Some(ViewerSource::Asset(url)) => info!("Job finished; showing model from '{}'", url),
            Some(ViewerSource::Placeholder) => debug!("Showing placeholder"),
            None => debug!("Clearing viewer"),
        }
        self.viewer.set_source(source);
    }

    /// Reduce the current state to the panel a front-end should show
    pub fn display(&self) -> Display {
        let state = match (self.poller.state(), self.poller.job()) {
            (PollerState::Idle, _) => DisplayState::Placeholder,
            (_, None) => DisplayState::LoadingJob,
            (_, Some(job)) => self.job_display(job),
        };

        Display {
            state,
            advisory: self.poller.advisory().map(str::to_owned),
            cancel_prompt: self.poller.cancel_prompt_open(),
            zoom: self.viewer.zoom(),
        }
    }

    fn job_display(&self, job: &Job) -> DisplayState {
        match job.status {
            JobStatus::Pending | JobStatus::Processing => DisplayState::Generating {
                status: job.status,
                percent: self.estimator.percent(),
                cancelling: self.poller.is_cancelling(),
            },
            JobStatus::Completed => match self.poller.api().asset_url(job) {
                Some(url) => {
                    let stage = self.model_stage(&url);
                    let result = job.result.as_ref();
                    DisplayState::Model {
                        url,
                        stage,
                        elapsed_seconds: result.map_or(0.0, |r| r.elapsed_seconds),
                        preview_url: result.and_then(|r| r.preview_url.clone()),
                    }
                }
                None => DisplayState::ModelUnavailable,
            },
            JobStatus::Failed => DisplayState::failed(job.error.as_deref()),
            JobStatus::Cancelled => DisplayState::cancelled(job.error.as_deref()),
        }
    }

    fn model_stage(&self, url: &str) -> ModelStage {
        match self.viewer.status() {
            ViewerStatus::Unmounted | ViewerStatus::Empty => ModelStage::Waiting,
            ViewerStatus::Loading { percent, .. } => ModelStage::Loading(*percent),
            ViewerStatus::Ready => ModelStage::Ready,
            ViewerStatus::Failed(error) => ModelStage::Error {
                source: error.attempted_source().unwrap_or(url).to_string(),
                message: error.to_string(),
            },
        }
    }
}
