//! Job status polling
//!
//! Tracks one job id at a time through `Idle -> Tracking -> Terminal`. Polls are
//! single deadlines on the frame clock; at most one fetch is in flight. Each
//! tracking subscription carries a liveness flag that is checked before any
//! fetch result is applied, so results for a job that is no longer tracked are
//! discarded instead of written.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use genview_core::{Deadline, PendingRequest};
use tracing::{debug, info, warn};

use crate::client::JobApi;
use crate::config::PollerConfig;
use crate::error::JobError;
use crate::types::{Job, JobStatus};

/// Where the poller is in a job's lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// No job id is tracked
    Idle,
    /// Job is pending/processing, or its first status has not arrived yet
    Tracking,
    /// Job reached completed, failed, or cancelled
    Terminal,
}

struct Subscription {
    job_id: String,
    alive: Arc<AtomicBool>,
}

impl Subscription {
    fn new(job_id: String) -> Self {
        Self {
            job_id,
            alive: Arc::new(AtomicBool::new(true)),
        }
    }
}

/// A request plus the liveness flag captured when it was issued
struct InFlight<T> {
    request: PendingRequest<T, JobError>,
    alive: Arc<AtomicBool>,
}

impl<T> InFlight<T> {
    /// Returns the result once, with whether its subscription is still live
    fn try_take(&self) -> Option<(Result<T, JobError>, bool)> {
        let result = self.request.try_recv()?;
        Some((result, self.alive.load(Ordering::Acquire)))
    }
}

/// Polls a job's status until it reaches a terminal state
pub struct JobPoller<A> {
    api: A,
    config: PollerConfig,
    subscription: Option<Subscription>,
    job: Option<Job>,
    advisory: Option<String>,
    next_poll: Option<Deadline>,
    poll: Option<InFlight<Job>>,
    cancel: Option<InFlight<()>>,
    cancel_prompt: bool,
    polls_issued: u64,
}

impl<A: JobApi> JobPoller<A> {
    pub fn new(api: A, config: PollerConfig) -> Self {
        Self {
            api,
            config,
            subscription: None,
            job: None,
            advisory: None,
            next_poll: None,
            poll: None,
            cancel: None,
            cancel_prompt: false,
            polls_issued: 0,
        }
    }

    /// The collaborator this poller talks to
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Begin tracking `job_id`, dropping everything about the previous job.
    /// The first poll is due immediately.
    pub fn start(&mut self, job_id: impl Into<String>, now: Duration) {
        self.stop();
        let job_id = job_id.into();
        info!("Tracking job {}", job_id);
        self.subscription = Some(Subscription::new(job_id));
        self.next_poll = Some(Deadline::after(now, Duration::ZERO));
    }

    /// Stop tracking. Pending timers are cleared and late results are discarded.
    pub fn stop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.alive.store(false, Ordering::Release);
            debug!("Stopped tracking job {}", subscription.job_id);
        }
        self.next_poll = None;
        self.poll = None;
        self.cancel = None;
        self.cancel_prompt = false;
        self.job = None;
        self.advisory = None;
    }

    pub fn state(&self) -> PollerState {
        match (&self.subscription, &self.job) {
            (None, _) => PollerState::Idle,
            (Some(_), Some(job)) if job.status.is_terminal() => PollerState::Terminal,
            (Some(_), _) => PollerState::Tracking,
        }
    }

    pub fn job_id(&self) -> Option<&str> {
        self.subscription.as_ref().map(|s| s.job_id.as_str())
    }

    /// Last known job state, if any status has arrived
    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    /// Transient failure text to show alongside the last known state
    pub fn advisory(&self) -> Option<&str> {
        self.advisory.as_deref()
    }

    /// When the next status fetch is due, if one is scheduled
    pub fn next_poll_at(&self) -> Option<Duration> {
        self.next_poll.map(|d| d.at())
    }

    pub fn is_fetching(&self) -> bool {
        self.poll.is_some()
    }

    /// A cancel call has been sent and has not answered yet
    pub fn is_cancelling(&self) -> bool {
        self.cancel.is_some()
    }

    pub fn cancel_prompt_open(&self) -> bool {
        self.cancel_prompt
    }

    pub fn polls_issued(&self) -> u64 {
        self.polls_issued
    }

    /// Apply finished requests and issue the next poll if it is due
    pub fn update(&mut self, now: Duration) {
        self.receive_cancel();
        self.receive_poll(now);
        self.issue_due_poll(now);
    }

    /// Open the confirmation step. Only an active job can be cancelled.
    pub fn request_cancel(&mut self) -> bool {
        if self.state() != PollerState::Tracking || self.cancel.is_some() {
            return false;
        }
        self.cancel_prompt = true;
        true
    }

    /// Close the confirmation step without cancelling
    pub fn dismiss_cancel(&mut self) {
        self.cancel_prompt = false;
    }

    /// The caller confirmed: send the cancel call and mark the job cancelled now.
    /// Polling stops regardless of how long the cancel call takes.
    pub fn confirm_cancel(&mut self) -> bool {
        if !std::mem::take(&mut self.cancel_prompt) || self.state() != PollerState::Tracking {
            return false;
        }
        let Some(subscription) = &self.subscription else {
            return false;
        };

        info!("Cancelling job {}", subscription.job_id);
        let request = self.api.cancel_job(&subscription.job_id);
        self.cancel = Some(InFlight {
            request,
            alive: Arc::clone(&subscription.alive),
        });

        let cancelled = match &self.job {
            Some(job) => job.with_status(JobStatus::Cancelled),
            None => Job::new(subscription.job_id.clone(), JobStatus::Cancelled),
        };
        self.job = Some(cancelled);
        self.next_poll = None;
        self.poll = None;
        true
    }

    fn receive_cancel(&mut self) {
        let Some((result, alive)) = self.cancel.as_ref().and_then(InFlight::try_take) else {
            return;
        };
        self.cancel = None;
        if !alive {
            return;
        }
        match result {
            Ok(()) => debug!("Cancel acknowledged"),
            Err(err) => {
                warn!("Cancel call failed: {}", err);
                self.advisory = Some(format!("Failed to cancel job: {}", err));
            }
        }
    }

    fn receive_poll(&mut self, now: Duration) {
        let Some((result, alive)) = self.poll.as_ref().and_then(InFlight::try_take) else {
            return;
        };
        self.poll = None;
        if !alive {
            debug!("Discarding status for a job that is no longer tracked");
            return;
        }

        match result {
            Ok(job) => self.apply(job, now),
            Err(err) => {
                let retry = self.config.retry_interval();
                warn!("Status fetch failed: {} (retrying in {:?})", err, retry);
                self.advisory = Some(err.to_string());
                self.next_poll = Some(Deadline::after(now, retry));
            }
        }
    }

    fn apply(&mut self, job: Job, now: Duration) {
        self.advisory = None;
        if job.status.is_active() {
            self.next_poll = Some(Deadline::after(now, self.config.interval()));
        } else {
            info!("Job {} finished with status {}", job.id, job.status);
            self.next_poll = None;
        }
        if self.job.as_ref().map(|j| j.status) != Some(job.status) {
            debug!("Job {} is {}", job.id, job.status);
        }
        self.job = Some(job);
    }

    fn issue_due_poll(&mut self, now: Duration) {
        if self.poll.is_some() {
            return;
        }
        let Some(subscription) = &self.subscription else {
            return;
        };
        match self.next_poll {
            Some(deadline) if deadline.is_due(now) => {}
            _ => return,
        }

        self.next_poll = None;
        self.polls_issued += 1;
        let request = self.api.fetch_status(&subscription.job_id);
        self.poll = Some(InFlight {
            request,
            alive: Arc::clone(&subscription.alive),
        });
    }
}
