//! Asynchronous asset loading.
//!
//! Every load ends as one [`AssetEvent`] on a flume channel. Loads decode off
//! the frame loop (a worker thread natively, a `spawn_local` future on the
//! web) and only finished values cross the channel, so whoever drains it can
//! mutate the scene without locks.

pub mod glb;
pub mod hdr;
pub mod progress;

use std::fmt;

use tracing::{debug, info};

use crate::config::AssetManifest;
use crate::error::Result;
use crate::model::{EnvironmentMap, Model};

pub use progress::{LoadingProgress, ProgressUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Environment,
    Character,
    Ground,
    Hand,
}

impl AssetKind {
    pub const ALL: [AssetKind; 4] = [AssetKind::Environment, AssetKind::Character, AssetKind::Ground, AssetKind::Hand];

    pub fn file<'a>(&self, manifest: &'a AssetManifest) -> &'a str {
        match self {
            AssetKind::Environment => &manifest.environment,
            AssetKind::Character => &manifest.character,
            AssetKind::Ground => &manifest.ground,
            AssetKind::Hand => &manifest.hand,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetKind::Environment => "environment",
            AssetKind::Character => "character",
            AssetKind::Ground => "ground",
            AssetKind::Hand => "hand",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub enum AssetPayload {
    Environment(EnvironmentMap),
    Model(Model),
}

/// Outcome of one load.
#[derive(Debug)]
pub struct AssetEvent {
    pub kind: AssetKind,
    /// Path or URL the asset came from.
    pub source: String,
    pub result: Result<AssetPayload>,
}

/// Turns raw file contents into the payload for `kind`.
pub fn decode(kind: AssetKind, source: &str, bytes: &[u8]) -> Result<AssetPayload> {
    match kind {
        AssetKind::Environment => hdr::decode_environment(bytes).map(AssetPayload::Environment),
        AssetKind::Character | AssetKind::Ground | AssetKind::Hand => {
            glb::parse_model(source, bytes).map(AssetPayload::Model)
        }
    }
}

/// Owns the event channel. Requests fan out; completions come back through
/// [`AssetLoader::drain`].
pub struct AssetLoader {
    tx: flume::Sender<AssetEvent>,
    rx: flume::Receiver<AssetEvent>,
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetLoader {
    pub fn new() -> Self {
        let (tx, rx) = flume::unbounded();
        Self { tx, rx }
    }

    /// Handle for delivering events from elsewhere (tests, custom sources).
    pub fn sender(&self) -> flume::Sender<AssetEvent> {
        self.tx.clone()
    }

    /// Starts every load in the manifest. Returns how many were started.
    pub fn request_all(&self, manifest: &AssetManifest) -> usize {
        for kind in AssetKind::ALL {
            self.request(kind, manifest.resolve(kind.file(manifest)));
        }
        AssetKind::ALL.len()
    }

    pub fn request(&self, kind: AssetKind, source: String) {
        info!(%kind, %source, "loading asset");
        spawn_load(kind, source, self.tx.clone());
    }

    /// Every event that has arrived since the last call, without blocking.
    pub fn drain(&self) -> Vec<AssetEvent> {
        self.rx.try_iter().collect()
    }
}

fn finish(tx: &flume::Sender<AssetEvent>, kind: AssetKind, source: String, result: Result<AssetPayload>) {
    debug!(%kind, ok = result.is_ok(), "asset load finished");
    // The receiver only goes away on shutdown.
    let _ = tx.send(AssetEvent { kind, source, result });
}

#[cfg(not(target_arch = "wasm32"))]
fn spawn_load(kind: AssetKind, source: String, tx: flume::Sender<AssetEvent>) {
    use crate::error::ViewerError;

    std::thread::spawn(move || {
        let result = std::fs::read(&source)
            .map_err(|e| ViewerError::Io { path: source.clone(), source: e })
            .and_then(|bytes| decode(kind, &source, &bytes));
        finish(&tx, kind, source, result);
    });
}

#[cfg(target_arch = "wasm32")]
fn spawn_load(kind: AssetKind, source: String, tx: flume::Sender<AssetEvent>) {
    wasm_bindgen_futures::spawn_local(async move {
        let result = fetch_bytes(&source).await.and_then(|bytes| decode(kind, &source, &bytes));
        finish(&tx, kind, source, result);
    });
}

#[cfg(target_arch = "wasm32")]
async fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
    use crate::error::ViewerError;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;

    let fail = |reason: String| ViewerError::Fetch { url: url.to_string(), reason };
    let window = web_sys::window().ok_or_else(|| fail("no window".into()))?;

    let resp = JsFuture::from(window.fetch_with_str(url)).await.map_err(|e| fail(format!("{e:?}")))?;
    let resp: web_sys::Response = resp.dyn_into().map_err(|_| fail("not a Response".into()))?;
    if !resp.ok() {
        return Err(fail(format!("HTTP {}", resp.status())));
    }
    let buf = resp.array_buffer().map_err(|e| fail(format!("{e:?}")))?;
    let buf = JsFuture::from(buf).await.map_err(|e| fail(format!("{e:?}")))?;
    Ok(js_sys::Uint8Array::new(&buf).to_vec())
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::error::ViewerError;
    use std::time::{Duration, Instant};

    fn wait_for(loader: &AssetLoader, n: usize) -> Vec<AssetEvent> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut events = Vec::new();
        while events.len() < n && Instant::now() < deadline {
            events.extend(loader.drain());
            std::thread::sleep(Duration::from_millis(5));
        }
        events
    }

    #[test]
    fn missing_files_each_report_an_io_failure() {
        let loader = AssetLoader::new();
        let manifest = AssetManifest { root: "/nonexistent/stagehand".into(), ..Default::default() };
        assert_eq!(loader.request_all(&manifest), 4);

        let events = wait_for(&loader, 4);
        assert_eq!(events.len(), 4);
        for event in &events {
            assert!(matches!(event.result, Err(ViewerError::Io { .. })), "{:?}", event.kind);
        }
        let hand = events.iter().find(|e| e.kind == AssetKind::Hand).unwrap();
        assert_eq!(hand.source, "/nonexistent/stagehand/hand.glb");
    }

    #[test]
    fn drain_is_empty_without_requests() {
        let loader = AssetLoader::new();
        assert!(loader.drain().is_empty());
    }

    #[test]
    fn environment_bytes_go_through_the_hdr_decoder() {
        let err = decode(AssetKind::Environment, "back.hdr", b"nope").unwrap_err();
        assert!(matches!(err, ViewerError::Image(_)));
        let err = decode(AssetKind::Hand, "hand.glb", b"nope").unwrap_err();
        assert!(matches!(err, ViewerError::Gltf(_)));
    }
}
