use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Cover art attached to a track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artwork {
    /// Picture embedded in the file's tags.
    Embedded { mime: String, data: Arc<[u8]> },
    /// No usable picture; the presentation layer draws its own placeholder.
    Placeholder,
}

impl Artwork {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Artwork::Placeholder)
    }

    /// Short human-readable description, e.g. `image/jpeg, 42 KiB`.
    pub fn describe(&self) -> String {
        match self {
            Artwork::Embedded { mime, data } => {
                format!("{}, {} KiB", mime, data.len().div_ceil(1024))
            }
            Artwork::Placeholder => "none".to_string(),
        }
    }
}

/// One playlist entry.
///
/// Every descriptive field already carries its fallback value; the loose,
/// partially-present shape of raw tags never gets past the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Source handed to the media output.
    pub path: PathBuf,
    pub title: String,
    pub artist: String,
    pub artists: Vec<String>,
    pub album: String,
    pub genre: Vec<String>,
    pub year: String,
    pub track_number: Option<u32>,
    pub duration: Duration,
    pub artwork: Artwork,
    /// ISRC code, used only to suppress re-adding the same recording.
    pub dedupe_key: Option<String>,
    pub display: String,
}
