//! Error types shared across the crate.
//!
//! None of these are fatal to a running player: per-file extraction failures
//! are logged and skipped, audio failures stop the affected source, and
//! settings failures fall back to defaults.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn one selected file into a catalog entry.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read metadata from {path}: {source}")]
    Extraction {
        path: PathBuf,
        #[source]
        source: lofty::error::LoftyError,
    },

    #[error("{0} is not a readable file")]
    NotAFile(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Batch-level ingestion failure. Per-file problems never end up here.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("could not start the metadata extraction pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("tracks were appended but the output rejected the load: {0}")]
    Output(#[from] AudioError),
}

/// Media output failures, reported by the audio thread.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device: {0}")]
    Device(#[from] rodio::StreamError),

    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: rodio::decoder::DecoderError,
    },

    #[error("the audio thread is gone")]
    Disconnected,
}

/// Settings could not be loaded or are out of range.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Load(#[from] ::config::ConfigError),

    #[error("{0}")]
    Invalid(String),
}
