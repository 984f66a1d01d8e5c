use thiserror::Error;

/// Every failure the viewer can report.
///
/// Load failures travel inside [`crate::assets::AssetEvent`] and end up as a
/// log line; nothing here is fatal once the GPU is up.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("invalid glTF asset: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("GPU initialisation failed: {0}")]
    Gpu(String),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("animation {index} requested but only {loaded} loaded")]
    AnimationNotLoaded { index: usize, loaded: usize },

    #[error("invalid node hierarchy: {0}")]
    InvalidHierarchy(String),

    #[error("asset {0} is not loaded")]
    MissingAsset(&'static str),
}

pub type Result<T, E = ViewerError> = std::result::Result<T, E>;
