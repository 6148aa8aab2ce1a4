use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::CatalogSettings;

pub(super) fn is_audio_file(path: &Path, settings: &CatalogSettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Expand a user selection into the audio files it names.
///
/// Files are kept in the order given (if their extension is accepted);
/// directories are walked in file-name order.
pub fn collect_media(selection: &[PathBuf], settings: &CatalogSettings) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();

    for root in selection {
        if root.is_file() {
            if is_audio_file(root, settings) {
                files.push(root.clone());
            } else {
                debug!(path = %root.display(), "ignoring non-audio file");
            }
            continue;
        }
        if !root.is_dir() {
            warn!(path = %root.display(), "selected path does not exist");
            continue;
        }

        let mut walker = WalkDir::new(root)
            .follow_links(settings.follow_links)
            .sort_by_file_name();

        // Non-recursive = only the root directory.
        let depth_cap = if settings.recursive {
            settings.max_depth
        } else {
            Some(1)
        };
        if let Some(d) = depth_cap {
            walker = walker.max_depth(d);
        }

        for entry in walker
            .into_iter()
            .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
            .filter_map(Result::ok)
        {
            let path = entry.path();
            if path.is_file() && is_audio_file(path, settings) {
                files.push(path.to_path_buf());
            }
        }
    }

    files
}
