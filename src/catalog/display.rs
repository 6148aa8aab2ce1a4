use crate::config::TrackDisplayField;

use super::model::Track;

/// Build a label for `track` according to the provided `fields` and separator.
///
/// This composes metadata fields (artist, title, album, year, genre, filename,
/// path) in the configured order and falls back to `title` when no parts were
/// produced. Used both for playlist rows and the now-playing line.
pub fn track_label(track: &Track, fields: &[TrackDisplayField], sep: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    let mut push = |s: &str| {
        let s = s.trim();
        if !s.is_empty() {
            parts.push(s.to_string());
        }
    };

    for f in fields {
        match f {
            TrackDisplayField::Display => {
                if track.display.trim().is_empty() {
                    // Not built yet: treat it as "artist - title".
                    push(&track.artist);
                    push(&track.title);
                } else {
                    push(&track.display);
                }
            }
            TrackDisplayField::Title => push(&track.title),
            TrackDisplayField::Artist => push(&track.artist),
            TrackDisplayField::Album => push(&track.album),
            TrackDisplayField::Year => push(&track.year),
            TrackDisplayField::Genre => push(&track.genre.join(", ")),
            TrackDisplayField::Filename => {
                if let Some(stem) = track.path.file_stem().and_then(|s| s.to_str()) {
                    push(stem);
                }
            }
            TrackDisplayField::Path => push(&track.path.display().to_string()),
        }
    }

    if parts.is_empty() {
        track.title.clone()
    } else {
        parts.join(sep)
    }
}
