use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

use tracing::{debug, error, info};

use crate::app::App;
use crate::catalog::{Catalog, MetadataExtractor, Track};
use crate::error::IngestError;
use crate::session::{MediaOutput, Player};

/// A selection extracted off the event loop, ready to be appended in one go.
pub struct IngestBatch {
    pub paths: usize,
    pub result: Result<Vec<Track>, IngestError>,
}

fn added_notice(added: usize) -> String {
    match added {
        0 => "No new tracks found".to_string(),
        1 => "Added 1 track".to_string(),
        n => format!("Added {n} tracks"),
    }
}

/// Ingest `selection` and report the outcome in the status box. Blocks until
/// every file has been read; used for the command-line selection.
pub fn ingest_paths<O: MediaOutput, E: MetadataExtractor>(
    player: &mut Player<O>,
    catalog: &Catalog<E>,
    selection: &[PathBuf],
    app: &mut App,
) {
    if selection.is_empty() {
        return;
    }
    match player.ingest(catalog, selection) {
        Ok(added) => {
            info!(added, paths = selection.len(), "added tracks");
            app.set_notice(added_notice(added));
        }
        Err(e) => {
            error!(error = %e, "ingest failed");
            app.set_notice(format!("Could not add tracks: {e}"));
        }
    }
}

/// Scan and extract `selection` on a worker thread. The finished batch is
/// sent on `tx`; the event loop keeps drawing meanwhile.
pub fn spawn_ingest<E: MetadataExtractor + 'static>(
    catalog: Arc<Catalog<E>>,
    selection: Vec<PathBuf>,
    tx: Sender<IngestBatch>,
    app: &mut App,
) {
    let paths = selection.len();
    let spawned = thread::Builder::new()
        .name("ingest".to_string())
        .spawn(move || {
            let result = catalog.scan(&selection);
            if tx.send(IngestBatch { paths, result }).is_err() {
                debug!("ingest finished after shutdown");
            }
        });
    match spawned {
        Ok(_) => app.set_notice("Adding tracks…".to_string()),
        Err(e) => {
            error!(error = %e, "cannot start ingest thread");
            app.set_notice(format!("Could not add tracks: {e}"));
        }
    }
}

/// Append a finished background batch and report the outcome.
pub fn apply_batch<O: MediaOutput>(player: &mut Player<O>, batch: IngestBatch, app: &mut App) {
    let appended = batch
        .result
        .and_then(|tracks| player.append(tracks).map_err(IngestError::from));
    match appended {
        Ok(added) => {
            info!(added, paths = batch.paths, "added tracks");
            app.set_notice(added_notice(added));
        }
        Err(e) => {
            error!(error = %e, "ingest failed");
            app.set_notice(format!("Could not add tracks: {e}"));
        }
    }
}
