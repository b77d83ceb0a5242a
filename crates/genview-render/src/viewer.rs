//! Viewer: mounts sessions on a surface and feeds them loaded assets

use std::time::Duration;

use genview_assets::{AssetFetcher, AssetLoader, LoadEvent};
use genview_core::Vec2;
use tracing::{info, warn};

use crate::config::ViewerConfig;
use crate::controls::ListenerId;
use crate::error::ViewerError;
use crate::renderer::Surface;
use crate::session::ViewerSession;

/// What the viewer displays
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerSource {
    /// Built-in sphere
    Placeholder,
    /// Remote glTF/GLB asset
    Asset(String),
}

#[derive(Debug, Clone)]
pub enum ViewerStatus {
    /// No surface mounted
    Unmounted,
    /// Mounted without a source
    Empty,
    /// Asset download in progress; `percent` is unknown until the size is declared
    Loading { url: String, percent: Option<u8> },
    Ready,
    Failed(ViewerError),
}

impl ViewerStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewerStatus::Loading { .. })
    }

    pub fn error(&self) -> Option<&ViewerError> {
        match self {
            ViewerStatus::Failed(error) => Some(error),
            _ => None,
        }
    }
}

type ZoomListener = Box<dyn FnMut(u32)>;

pub struct Viewer<F> {
    config: ViewerConfig,
    loader: AssetLoader<F>,
    surface: Option<Box<dyn Surface>>,
    source: Option<ViewerSource>,
    session: Option<ViewerSession>,
    status: ViewerStatus,
    zoom: u32,
    zoom_listeners: Vec<(ListenerId, ZoomListener)>,
    next_listener: u64,
}

impl<F: AssetFetcher> Viewer<F> {
    pub fn new(fetcher: F, config: ViewerConfig) -> Self {
        Self {
            zoom: config.clamp_zoom(config.default_zoom),
            config,
            loader: AssetLoader::new(fetcher),
            surface: None,
            source: None,
            session: None,
            status: ViewerStatus::Unmounted,
            zoom_listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// Attach to a surface, replacing any previous one
    pub fn mount(&mut self, surface: Box<dyn Surface>) {
        if self.surface.is_some() {
            self.unmount();
        }
        self.surface = Some(surface);
        self.rebuild();
    }

    /// Tear down the session and detach from the surface. The source is kept
    /// for the next mount.
    pub fn unmount(&mut self) {
        self.close_session();
        self.surface = None;
        self.status = ViewerStatus::Unmounted;
    }

    pub fn is_mounted(&self) -> bool {
        self.surface.is_some()
    }

    /// Change what is displayed. The current session is torn down before the
    /// new one is built; setting the current source again does nothing.
    pub fn set_source(&mut self, source: Option<ViewerSource>) {
        if self.source == source {
            return;
        }
        self.source = source;
        self.rebuild();
    }

    pub fn source(&self) -> Option<&ViewerSource> {
        self.source.as_ref()
    }

    fn close_session(&mut self) {
        self.loader.cancel();
        if let Some(mut session) = self.session.take() {
            session.teardown();
        }
    }

    fn rebuild(&mut self) {
        self.close_session();

        let Some(surface) = self.surface.as_deref() else {
            self.status = ViewerStatus::Unmounted;
            return;
        };
        let Some(source) = self.source.clone() else {
            self.status = ViewerStatus::Empty;
            return;
        };

        let mut session = match ViewerSession::new(surface, self.config.clone()) {
            Ok(session) => session,
            Err(e) => {
                warn!("Viewer could not start a session: {}", e);
                self.status = ViewerStatus::Failed(e.into());
                return;
            }
        };

        self.status = match source {
            ViewerSource::Placeholder => {
                session.show_placeholder(self.zoom);
                ViewerStatus::Ready
            }
            ViewerSource::Asset(url) => {
                self.loader.load(url.clone());
                ViewerStatus::Loading { url, percent: None }
            }
        };
        self.session = Some(session);
    }

    /// Apply a zoom percentage chosen outside the viewer. Listeners are not notified.
    pub fn set_zoom(&mut self, percent: u32) {
        self.zoom = self.config.clamp_zoom(percent);
        if let Some(session) = &mut self.session {
            session.set_zoom(self.zoom);
        }
    }

    pub fn zoom(&self) -> u32 {
        self.zoom
    }

    /// Register a listener for zoom changes made through the camera controls
    pub fn on_zoom_change(&mut self, listener: impl FnMut(u32) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.zoom_listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_zoom_listener(&mut self, id: ListenerId) -> bool {
        let before = self.zoom_listeners.len();
        self.zoom_listeners.retain(|(listener, _)| *listener != id);
        self.zoom_listeners.len() != before
    }

    /// Follow a surface resize. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if let Some(session) = &mut self.session {
            session.resize(width, height);
        }
    }

    pub fn orbit(&mut self, delta: Vec2) {
        if let Some(session) = &mut self.session {
            session.orbit(delta);
        }
    }

    pub fn scroll(&mut self, steps: f32) {
        if let Some(session) = &mut self.session {
            session.scroll(steps);
        }
    }

    /// Apply finished loads and run the session's render loop once
    pub fn frame(&mut self, now: Duration) {
        for event in self.loader.poll() {
            match event {
                LoadEvent::Progress { percent, .. } => {
                    if let ViewerStatus::Loading { percent: current, .. } = &mut self.status {
                        *current = Some(percent);
                    }
                }
                LoadEvent::Loaded { url, asset, .. } => {
                    if let Some(session) = &mut self.session {
                        session.show_asset(&asset, self.zoom);
                        info!("Showing model from '{}'", url);
                        self.status = ViewerStatus::Ready;
                    }
                }
                LoadEvent::Failed { url, error, .. } => {
                    if let Some(session) = &mut self.session {
                        session.fail();
                    }
                    self.status = ViewerStatus::Failed(ViewerError::AssetLoad { url, error });
                }
            }
        }

        let settled = self.session.as_mut().and_then(|s| s.frame(now));
        if let Some(percent) = settled {
            self.zoom = percent;
            for (_, listener) in &mut self.zoom_listeners {
                listener(percent);
            }
        }
    }

    pub fn status(&self) -> &ViewerStatus {
        &self.status
    }

    pub fn session(&self) -> Option<&ViewerSession> {
        self.session.as_ref()
    }

    pub fn loader(&self) -> &AssetLoader<F> {
        &self.loader
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::headless::HeadlessSurface;
    use genview_assets::fixtures::TRIANGLE_GLTF;
    use genview_assets::{AssetErrorKind, FetchSink};
    use genview_core::millis;

    #[derive(Default)]
    struct FakeFetcher {
        sinks: RefCell<Vec<FetchSink>>,
    }

    impl FakeFetcher {
        fn complete(&self, body: &[u8]) {
            let sink = self.sinks.borrow_mut().remove(0);
            sink.progress(body.len() as u64 / 2, Some(body.len() as u64));
            sink.finish_bytes(body.to_vec());
        }
    }

    impl AssetFetcher for FakeFetcher {
        fn fetch(&self, sink: FetchSink) {
            self.sinks.borrow_mut().push(sink);
        }
    }

    fn mounted() -> (Rc<FakeFetcher>, HeadlessSurface, Viewer<Rc<FakeFetcher>>) {
        let fetcher = Rc::new(FakeFetcher::default());
        let surface = HeadlessSurface::new(800, 500);
        let mut viewer = Viewer::new(Rc::clone(&fetcher), ViewerConfig::default());
        viewer.mount(Box::new(surface.clone()));
        (fetcher, surface, viewer)
    }

    #[test]
    fn test_mount_without_source_builds_nothing() {
        let (_, surface, viewer) = mounted();
        assert!(matches!(viewer.status(), ViewerStatus::Empty));
        assert!(viewer.session().is_none());
        assert_eq!(surface.stats().renderers_created, 0);
    }

    #[test]
    fn test_asset_load_progress_then_ready() {
        let (fetcher, surface, mut viewer) = mounted();
        viewer.set_source(Some(ViewerSource::Asset("https://cdn/tri.gltf".into())));
        assert!(viewer.status().is_loading());

        fetcher.complete(TRIANGLE_GLTF.as_bytes());
        viewer.frame(millis(16));

        assert!(matches!(viewer.status(), ViewerStatus::Ready));
        let session = viewer.session().unwrap();
        assert!((session.base_distance() - 4.0).abs() < 1e-5);
        assert_eq!(surface.stats().draw_calls, 2);
    }

    #[test]
    fn test_progress_is_reported_while_loading() {
        let (fetcher, _, mut viewer) = mounted();
        viewer.set_source(Some(ViewerSource::Asset("https://cdn/tri.gltf".into())));

        fetcher.sinks.borrow()[0].progress(50, Some(200));
        viewer.frame(millis(16));
        assert!(matches!(
            viewer.status(),
            ViewerStatus::Loading { percent: Some(25), .. }
        ));
    }

    #[test]
    fn test_malformed_asset_fails_and_zoom_is_noop() {
        let (fetcher, surface, mut viewer) = mounted();
        viewer.set_source(Some(ViewerSource::Asset("https://cdn/broken.glb".into())));

        fetcher.complete(b"not a model");
        viewer.frame(millis(16));

        let error = viewer.status().error().unwrap();
        assert_eq!(error.attempted_source(), Some("https://cdn/broken.glb"));
        assert!(matches!(
            error,
            ViewerError::AssetLoad { error, .. } if error.kind() == AssetErrorKind::Parse
        ));
        assert!(error.to_string().contains("https://cdn/broken.glb"));

        viewer.set_zoom(150);
        let session = viewer.session().unwrap();
        assert!(session.camera().is_none());
        assert!(session.is_running());
        assert_eq!(surface.stats().live_renderers(), 1);
    }

    #[test]
    fn test_superseded_load_is_ignored() {
        let (fetcher, _, mut viewer) = mounted();
        viewer.set_source(Some(ViewerSource::Asset("https://cdn/a.gltf".into())));
        viewer.set_source(Some(ViewerSource::Asset("https://cdn/b.gltf".into())));

        let stale = fetcher.sinks.borrow_mut().remove(0);
        stale.finish_bytes(b"garbage".to_vec());
        viewer.frame(millis(16));
        assert!(matches!(
            viewer.status(),
            ViewerStatus::Loading { url, .. } if url == "https://cdn/b.gltf"
        ));

        fetcher.complete(TRIANGLE_GLTF.as_bytes());
        viewer.frame(millis(32));
        assert!(matches!(viewer.status(), ViewerStatus::Ready));
    }

    #[test]
    fn test_source_change_disposes_before_rebuild() {
        let (_, surface, mut viewer) = mounted();
        viewer.set_source(Some(ViewerSource::Placeholder));
        viewer.set_source(Some(ViewerSource::Asset("https://cdn/a.gltf".into())));
        viewer.set_source(Some(ViewerSource::Placeholder));

        let stats = surface.stats();
        assert_eq!(stats.renderers_created, 3);
        assert_eq!(stats.renderers_disposed, 2);
        assert_eq!(stats.live_renderers(), 1);
    }

    #[test]
    fn test_same_source_keeps_session() {
        let (_, surface, mut viewer) = mounted();
        viewer.set_source(Some(ViewerSource::Placeholder));
        viewer.set_source(Some(ViewerSource::Placeholder));
        assert_eq!(surface.stats().renderers_created, 1);
    }

    #[test]
    fn test_user_zoom_notifies_listeners() {
        let (_, _, mut viewer) = mounted();
        viewer.set_source(Some(ViewerSource::Placeholder));

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        viewer.on_zoom_change(move |p| sink.borrow_mut().push(p));

        viewer.set_zoom(150);
        viewer.frame(millis(0));
        viewer.frame(millis(100));
        assert!(seen.borrow().is_empty());

        viewer.scroll(1.0);
        viewer.frame(millis(200));
        viewer.frame(millis(260));
        // 2.0 * 0.95 = 1.9 from a base of 3.0
        assert_eq!(*seen.borrow(), vec![158]);
        assert_eq!(viewer.zoom(), 158);
    }

    #[test]
    fn test_zoom_survives_rebuild() {
        let (_, _, mut viewer) = mounted();
        viewer.set_zoom(50);
        viewer.set_source(Some(ViewerSource::Placeholder));
        let session = viewer.session().unwrap();
        assert!((session.camera().unwrap().distance() - 6.0).abs() < 1e-5);
    }

    #[test]
    fn test_unmount_tears_down() {
        let (_, surface, mut viewer) = mounted();
        viewer.set_source(Some(ViewerSource::Asset("https://cdn/a.gltf".into())));
        viewer.unmount();

        assert!(matches!(viewer.status(), ViewerStatus::Unmounted));
        assert!(!viewer.loader().is_loading());
        assert_eq!(surface.stats().live_renderers(), 0);

        viewer.mount(Box::new(surface.clone()));
        assert!(viewer.status().is_loading());
        assert_eq!(surface.stats().live_renderers(), 1);
    }

    #[test]
    fn test_surface_failure_is_reported() {
        let fetcher = Rc::new(FakeFetcher::default());
        let surface = HeadlessSurface::new(800, 500);
        surface.fail_next_renderer();
        let mut viewer = Viewer::new(fetcher, ViewerConfig::default());
        viewer.mount(Box::new(surface));
        viewer.set_source(Some(ViewerSource::Placeholder));

        assert!(matches!(
            viewer.status(),
            ViewerStatus::Failed(ViewerError::Surface(_))
        ));
        assert!(viewer.session().is_none());
    }
}
