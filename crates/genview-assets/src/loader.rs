//! Asset loading with supersession
//!
//! Every `load` bumps a generation counter. Fetch messages carry the generation
//! that started them and are compared against the active load when drained, so
//! a superseded download is ignored on arrival rather than interrupted.
//! Fetchers deliver assets already parsed; `poll` only routes results.

use std::sync::mpsc;

use tracing::{debug, info, warn};

use crate::error::AssetError;
use crate::fetch::{AssetFetcher, FetchMessage, FetchSink};
use crate::mesh::SceneAsset;

/// Outcome of draining the loader for the current frame
#[derive(Debug)]
pub enum LoadEvent {
    /// Percentage of declared bytes received. Not emitted when the size is unknown.
    Progress { generation: u64, percent: u8 },
    Loaded {
        generation: u64,
        url: String,
        asset: SceneAsset,
    },
    Failed {
        generation: u64,
        url: String,
        error: AssetError,
    },
}

struct ActiveLoad {
    generation: u64,
    url: String,
}

/// Fetches and parses one asset at a time
pub struct AssetLoader<F> {
    fetcher: F,
    generation: u64,
    active: Option<ActiveLoad>,
    sender: mpsc::Sender<FetchMessage>,
    receiver: mpsc::Receiver<FetchMessage>,
}

impl<F: AssetFetcher> AssetLoader<F> {
    pub fn new(fetcher: F) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            fetcher,
            generation: 0,
            active: None,
            sender,
            receiver,
        }
    }

    /// Start loading `url`, superseding any load still in flight.
    /// Returns the generation that identifies this load's events.
    pub fn load(&mut self, url: impl Into<String>) -> u64 {
        let url = url.into();
        self.generation += 1;
        if let Some(previous) = self.active.take() {
            debug!("Load of '{}' superseded by '{}'", previous.url, url);
        }
        info!("Loading asset '{}'", url);

        self.active = Some(ActiveLoad {
            generation: self.generation,
            url: url.clone(),
        });
        self.fetcher
            .fetch(FetchSink::new(self.generation, url, self.sender.clone()));
        self.generation
    }

    /// Abandon the active load; its result will be ignored when it arrives
    pub fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            debug!("Load of '{}' cancelled", active.url);
            self.generation += 1;
        }
    }

    pub fn is_loading(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_url(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.url.as_str())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.generation == generation)
    }

    /// Drain fetch messages and drop stale results
    pub fn poll(&mut self) -> Vec<LoadEvent> {
        let mut events = Vec::new();

        while let Ok(message) = self.receiver.try_recv() {
            match message {
                FetchMessage::Progress {
                    generation,
                    received,
                    total,
                } => {
                    if !self.is_current(generation) {
                        continue;
                    }
                    if let Some(total) = total.filter(|&t| t > 0) {
                        let percent = (received as f64 / total as f64 * 100.0).round().min(100.0);
                        events.push(LoadEvent::Progress {
                            generation,
                            percent: percent as u8,
                        });
                    }
                }
                FetchMessage::Finished { generation, result } => {
                    if !self.is_current(generation) {
                        debug!("Discarding result of superseded load {}", generation);
                        continue;
                    }
                    let Some(active) = self.active.take() else {
                        continue;
                    };

                    match result {
                        Ok(asset) => {
                            info!("Loaded asset '{}'", active.url);
                            events.push(LoadEvent::Loaded {
                                generation,
                                url: active.url,
                                asset,
                            });
                        }
                        Err(error) => {
                            warn!("Asset load failed: {}", error);
                            events.push(LoadEvent::Failed {
                                generation,
                                url: active.url,
                                error,
                            });
                        }
                    }
                }
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::error::AssetErrorKind;
    use crate::fixtures::TRIANGLE_GLTF;
    use crate::gltf_loader::load_gltf_slice;

    #[derive(Default)]
    struct FakeFetcher {
        sinks: RefCell<Vec<FetchSink>>,
    }

    impl FakeFetcher {
        fn take(&self, index: usize) -> FetchSink {
            self.sinks.borrow_mut().remove(index)
        }
    }

    impl AssetFetcher for FakeFetcher {
        fn fetch(&self, sink: FetchSink) {
            self.sinks.borrow_mut().push(sink);
        }
    }

    fn loader() -> (Rc<FakeFetcher>, AssetLoader<Rc<FakeFetcher>>) {
        let fetcher = Rc::new(FakeFetcher::default());
        (Rc::clone(&fetcher), AssetLoader::new(fetcher))
    }

    #[test]
    fn test_progress_is_reported_only_with_known_total() {
        let (fetcher, mut loader) = loader();
        loader.load("https://cdn/model.glb");

        let sinks = fetcher.sinks.borrow();
        sinks[0].progress(256, Some(1024));
        sinks[0].progress(512, None);
        sinks[0].progress(1023, Some(1024));
        drop(sinks);

        let events = loader.poll();
        let percents: Vec<u8> = events
            .iter()
            .map(|e| match e {
                LoadEvent::Progress { percent, .. } => *percent,
                other => panic!("unexpected event {:?}", other),
            })
            .collect();
        assert_eq!(percents, vec![25, 100]);
        assert!(loader.is_loading());
    }

    #[test]
    fn test_successful_load_yields_parsed_asset() {
        let (fetcher, mut loader) = loader();
        let generation = loader.load("https://cdn/triangle.gltf");
        fetcher.take(0).finish_bytes(TRIANGLE_GLTF.as_bytes().to_vec());

        let mut events = loader.poll();
        assert_eq!(events.len(), 1);
        match events.remove(0) {
            LoadEvent::Loaded { generation: g, url, asset } => {
                assert_eq!(g, generation);
                assert_eq!(url, "https://cdn/triangle.gltf");
                assert_eq!(asset.vertex_count(), 3);
            }
            other => panic!("expected Loaded, got {:?}", other),
        }
        assert!(!loader.is_loading());
    }

    #[test]
    fn test_transport_failure_is_classified_as_network() {
        let (fetcher, mut loader) = loader();
        loader.load("https://cdn/missing.glb");
        fetcher.take(0).finish(Err(AssetError::HttpStatus {
            url: "https://cdn/missing.glb".into(),
            status: 404,
        }));

        match loader.poll().remove(0) {
            LoadEvent::Failed { error, url, .. } => {
                assert_eq!(error.kind(), AssetErrorKind::Network);
                assert_eq!(url, "https://cdn/missing.glb");
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_payload_is_classified_as_parse() {
        let (fetcher, mut loader) = loader();
        loader.load("https://cdn/broken.glb");
        fetcher.take(0).finish_bytes(b"glTF but not really".to_vec());

        match loader.poll().remove(0) {
            LoadEvent::Failed { error, .. } => assert_eq!(error.kind(), AssetErrorKind::Parse),
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn test_superseded_result_is_ignored() {
        let (fetcher, mut loader) = loader();
        let first = loader.load("https://cdn/a.gltf");
        let second = loader.load("https://cdn/b.gltf");
        assert!(second > first);

        let sink_a = fetcher.take(0);
        let sink_b = fetcher.take(0);
        sink_a.progress(1, Some(2));
        sink_a.finish_bytes(TRIANGLE_GLTF.as_bytes().to_vec());
        assert!(loader.poll().is_empty());
        assert_eq!(loader.active_url(), Some("https://cdn/b.gltf"));

        sink_b.finish_bytes(TRIANGLE_GLTF.as_bytes().to_vec());
        let events = loader.poll();
        assert!(matches!(
            events.as_slice(),
            [LoadEvent::Loaded { generation, url, .. }] if *generation == second && url == "https://cdn/b.gltf"
        ));
    }

    #[test]
    fn test_cancelled_load_is_ignored() {
        let (fetcher, mut loader) = loader();
        loader.load("https://cdn/a.gltf");
        loader.cancel();
        assert!(!loader.is_loading());

        fetcher.take(0).finish(Err(AssetError::transport("https://cdn/a.gltf", "reset")));
        assert!(loader.poll().is_empty());
    }

    #[test]
    fn test_abandoned_fetch_fails_the_load() {
        let (fetcher, mut loader) = loader();
        loader.load("https://cdn/a.gltf");
        drop(fetcher.take(0));

        assert!(matches!(
            loader.poll().as_slice(),
            [LoadEvent::Failed { error: AssetError::Transport { .. }, .. }]
        ));
    }

    #[test]
    fn test_parsed_asset_is_delivered_without_reparsing() {
        let (fetcher, mut loader) = loader();
        let generation = loader.load("https://cdn/prebuilt.glb");

        // Parsed off the frame thread, as HttpFetcher does on its blocking pool
        let asset = load_gltf_slice("https://cdn/prebuilt.glb", TRIANGLE_GLTF.as_bytes()).unwrap();
        let handle = std::thread::spawn({
            let sink = fetcher.take(0);
            move || sink.finish(Ok(asset))
        });
        handle.join().unwrap();

        match loader.poll().as_slice() {
            [LoadEvent::Loaded { generation: g, asset, .. }] => {
                assert_eq!(*g, generation);
                assert_eq!(asset.primitive_count(), 1);
            }
            other => panic!("expected Loaded, got {:?}", other),
        }
    }
}
