//! Binary asset download
//!
//! Fetchers report through a `FetchSink` tagged with the generation of the load
//! that started them. The loader compares that tag when messages arrive, so a
//! fetcher never needs to know whether its result is still wanted.
//!
//! Parsing happens on the fetcher's side. The frame thread only receives
//! progress and a finished `SceneAsset`.

use std::rc::Rc;
use std::sync::mpsc;

use reqwest::Client;
use tracing::debug;

use crate::error::AssetError;
use crate::gltf_loader::load_gltf_slice;
use crate::mesh::SceneAsset;

/// Messages a fetch sends back to the loader
#[derive(Debug)]
pub enum FetchMessage {
    Progress {
        generation: u64,
        received: u64,
        /// Declared size, when the response carried one
        total: Option<u64>,
    },
    Finished {
        generation: u64,
        result: Result<SceneAsset, AssetError>,
    },
}

/// Reporting handle for one fetch.
///
/// Dropping a sink without calling `finish` reports a transport failure, so an
/// abandoned download cannot leave its load pending forever.
pub struct FetchSink {
    generation: u64,
    url: String,
    sender: Option<mpsc::Sender<FetchMessage>>,
}

impl FetchSink {
    pub(crate) fn new(generation: u64, url: String, sender: mpsc::Sender<FetchMessage>) -> Self {
        Self {
            generation,
            url,
            sender: Some(sender),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Report bytes received so far
    pub fn progress(&self, received: u64, total: Option<u64>) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(FetchMessage::Progress {
                generation: self.generation,
                received,
                total,
            });
        }
    }

    /// Deliver the parsed asset or the failure
    pub fn finish(mut self, result: Result<SceneAsset, AssetError>) {
        self.send_finished(result);
    }

    /// Parse downloaded glTF/GLB bytes on the calling thread, then deliver the result
    pub fn finish_bytes(self, bytes: Vec<u8>) {
        let result = load_gltf_slice(&self.url, &bytes);
        self.finish(result);
    }

    fn send_finished(&mut self, result: Result<SceneAsset, AssetError>) {
        if let Some(sender) = self.sender.take() {
            let _ = sender.send(FetchMessage::Finished {
                generation: self.generation,
                result,
            });
        }
    }
}

impl Drop for FetchSink {
    fn drop(&mut self) {
        if self.sender.is_some() {
            let error = AssetError::transport(&self.url, "download abandoned");
            self.send_finished(Err(error));
        }
    }
}

/// Source of raw asset bytes.
///
/// `fetch` must return immediately and report through the sink, from any thread.
/// Fetchers do not retry; retry policy belongs to whoever requested the load.
pub trait AssetFetcher {
    fn fetch(&self, sink: FetchSink);
}

impl<T: AssetFetcher + ?Sized> AssetFetcher for Rc<T> {
    fn fetch(&self, sink: FetchSink) {
        (**self).fetch(sink)
    }
}

/// Downloads assets over HTTP on a background tokio runtime and parses them on
/// its blocking pool
pub struct HttpFetcher {
    runtime: tokio::runtime::Handle,
    client: Client,
}

impl HttpFetcher {
    pub fn new(runtime: tokio::runtime::Handle, client: Client) -> Self {
        Self { runtime, client }
    }
}

impl AssetFetcher for HttpFetcher {
    fn fetch(&self, sink: FetchSink) {
        let client = self.client.clone();
        self.runtime.spawn(async move {
            match download(&client, &sink).await {
                Ok(bytes) => {
                    // A panicking parse drops the sink, which reports the load as failed
                    let _ = tokio::task::spawn_blocking(move || sink.finish_bytes(bytes)).await;
                }
                Err(error) => sink.finish(Err(error)),
            }
        });
    }
}

/// Cap on the up-front allocation taken from a Content-Length header
const MAX_PREALLOCATION: u64 = 64 * 1024 * 1024;

async fn download(client: &Client, sink: &FetchSink) -> Result<Vec<u8>, AssetError> {
    let url = sink.url();
    debug!("GET {}", url);

    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AssetError::transport(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AssetError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let total = response.content_length().filter(|&n| n > 0);
    let mut bytes = Vec::with_capacity(total.unwrap_or(0).min(MAX_PREALLOCATION) as usize);
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| AssetError::transport(url, e))?
    {
        bytes.extend_from_slice(&chunk);
        sink.progress(bytes.len() as u64, total);
    }

    debug!("Downloaded {} bytes from {}", bytes.len(), url);
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssetErrorKind;
    use crate::fixtures::TRIANGLE_GLTF;

    #[test]
    fn test_dropped_sink_reports_transport_failure() {
        let (tx, rx) = mpsc::channel();
        let sink = FetchSink::new(3, "https://cdn/model.glb".into(), tx);
        drop(sink);

        match rx.try_recv().unwrap() {
            FetchMessage::Finished { generation, result } => {
                assert_eq!(generation, 3);
                assert_eq!(result.unwrap_err().kind(), AssetErrorKind::Network);
            }
            other => panic!("expected Finished, got {:?}", other),
        }
    }

    #[test]
    fn test_finished_sink_sends_exactly_once() {
        let (tx, rx) = mpsc::channel();
        let sink = FetchSink::new(1, "a.gltf".into(), tx);
        sink.progress(10, Some(20));
        sink.finish_bytes(TRIANGLE_GLTF.as_bytes().to_vec());

        let messages: Vec<_> = rx.try_iter().collect();
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[0], FetchMessage::Progress { received: 10, total: Some(20), .. }));
        assert!(matches!(
            &messages[1],
            FetchMessage::Finished { result: Ok(asset), .. } if asset.vertex_count() == 3
        ));
    }

    #[test]
    fn test_finish_bytes_reports_parse_failure() {
        let (tx, rx) = mpsc::channel();
        let sink = FetchSink::new(2, "broken.glb".into(), tx);
        sink.finish_bytes(b"not a model".to_vec());

        match rx.try_recv().unwrap() {
            FetchMessage::Finished { result, .. } => {
                assert_eq!(result.unwrap_err().kind(), AssetErrorKind::Parse);
            }
            other => panic!("expected Finished, got {:?}", other),
        }
    }
}
