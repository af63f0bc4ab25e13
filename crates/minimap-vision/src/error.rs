use std::path::PathBuf;
use thiserror::Error;

/// Hard failures of a detection call. Everything else degrades to
/// "Not visible".
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("failed to read minimap {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to decode minimap bytes: {0}")]
    ImageDecode(#[from] image::ImageError),
    #[error("minimap image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
}

/// Why a champion icon could not be used as a template.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("no icon for {champion} at {path}")]
    Missing { champion: String, path: PathBuf },
    #[error("unreadable icon {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("icon {path} is {width}x{height}, smaller than the {required}px template")]
    TooSmall {
        path: PathBuf,
        width: u32,
        height: u32,
        required: u32,
    },
}
