use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::CatalogSettings;
use crate::error::IngestError;

use super::metadata::{MetadataExtractor, build_track};
use super::model::Track;
use super::scan::collect_media;

/// Turns selected files into playlist candidates.
pub struct Catalog<E> {
    extractor: E,
    settings: CatalogSettings,
}

impl<E: MetadataExtractor> Catalog<E> {
    pub fn new(extractor: E, settings: CatalogSettings) -> Self {
        Self {
            extractor,
            settings,
        }
    }

    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    /// Expand `selection` into media files and extract them as one batch.
    pub fn scan(&self, selection: &[PathBuf]) -> Result<Vec<Track>, IngestError> {
        let files = collect_media(selection, &self.settings);
        let tracks = self.extract_batch(&files)?;
        debug!(files = files.len(), tracks = tracks.len(), "scanned selection");
        Ok(tracks)
    }

    /// Extract every file of a batch, dropping the ones that fail.
    ///
    /// Up to `extraction_workers` files are read concurrently. The returned
    /// candidates keep the order of `files` regardless of completion order.
    pub fn extract_batch(&self, files: &[PathBuf]) -> Result<Vec<Track>, IngestError> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.settings.extraction_workers.clamp(1, files.len()))
            .thread_name(|i| format!("extract-{i}"))
            .build()?;

        let tracks: Vec<Track> = pool.install(|| {
            files
                .par_iter()
                .filter_map(|path| match self.extractor.extract(path) {
                    Ok(meta) => Some(build_track(path, meta, &self.settings)),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping file");
                        None
                    }
                })
                .collect()
        });
        Ok(tracks)
    }
}

/// Drop candidates whose dedupe key is already present, either in the
/// existing playlist or earlier in the same batch. Candidates without a key
/// always pass.
pub fn dedupe(existing: &[Arc<Track>], candidates: Vec<Track>) -> Vec<Track> {
    let mut seen: HashSet<String> = existing
        .iter()
        .filter_map(|t| t.dedupe_key.clone())
        .collect();

    candidates
        .into_iter()
        .filter(|t| match &t.dedupe_key {
            Some(key) if !seen.insert(key.clone()) => {
                debug!(path = %t.path.display(), key = %key, "duplicate track dropped");
                false
            }
            _ => true,
        })
        .collect()
}
