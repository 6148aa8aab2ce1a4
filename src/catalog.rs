//! Track catalog: file selection, metadata extraction and duplicate filtering.
//!
//! Nothing in here knows about playback. The session consumes the tracks
//! produced by [`Catalog::extract_batch`] and filters them with [`dedupe`].

mod display;
mod ingest;
mod metadata;
mod model;
mod scan;

pub use display::track_label;
pub use ingest::{Catalog, dedupe};
pub use metadata::{
    LoftyExtractor, MetadataExtractor, RawMetadata, RawPicture, build_track,
};
pub use model::{Artwork, Track};
pub use scan::collect_media;
