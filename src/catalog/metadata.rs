//! Metadata extraction boundary.
//!
//! Extractors return a [`RawMetadata`] record in which every field is
//! optional. [`build_track`] is the single place where fallbacks are applied
//! and the record becomes a [`Track`].

use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, Tag};

use crate::config::CatalogSettings;
use crate::error::CatalogError;

use super::display::track_label;
use super::model::{Artwork, Track};

/// Embedded picture as found in the tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPicture {
    pub mime: Option<String>,
    pub data: Vec<u8>,
}

/// Whatever an extractor managed to read. Any subset may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub artists: Vec<String>,
    pub album: Option<String>,
    pub track_number: Option<u32>,
    pub year: Option<String>,
    pub genres: Vec<String>,
    pub isrc: Option<String>,
    pub picture: Option<RawPicture>,
    pub duration: Option<Duration>,
}

/// Reads tags and stream properties from one audio file.
pub trait MetadataExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<RawMetadata, CatalogError>;
}

/// Production extractor backed by `lofty`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyExtractor;

impl LoftyExtractor {
    fn from_tag(tag: &Tag, meta: &mut RawMetadata) {
        meta.title = non_empty(tag.title());
        meta.artist = non_empty(tag.artist());
        meta.album = non_empty(tag.album());
        meta.track_number = tag.track();

        meta.artists = tag
            .get_strings(&ItemKey::TrackArtist)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        meta.genres = tag
            .get_strings(&ItemKey::Genre)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        meta.year = tag
            .get_string(&ItemKey::Year)
            .or_else(|| tag.get_string(&ItemKey::RecordingDate))
            .and_then(year_from_date);

        meta.isrc = tag
            .get_string(&ItemKey::Isrc)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        meta.picture = tag.pictures().first().map(|pic| RawPicture {
            mime: pic.mime_type().map(|m| m.as_str().to_string()),
            data: pic.data().to_vec(),
        });
    }
}

impl MetadataExtractor for LoftyExtractor {
    fn extract(&self, path: &Path) -> Result<RawMetadata, CatalogError> {
        if !path.is_file() {
            return Err(CatalogError::NotAFile(path.to_path_buf()));
        }

        let extraction = |source| CatalogError::Extraction {
            path: path.to_path_buf(),
            source,
        };
        let tagged = Probe::open(path)
            .map_err(extraction)?
            .read()
            .map_err(extraction)?;

        let mut meta = RawMetadata {
            duration: Some(tagged.properties().duration()),
            ..RawMetadata::default()
        };

        if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
            Self::from_tag(tag, &mut meta);
        }

        Ok(meta)
    }
}

fn non_empty(v: Option<Cow<'_, str>>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// `2004-05-01` and `2004` both become `2004`.
pub(super) fn year_from_date(s: &str) -> Option<String> {
    let year: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
    (year.len() == 4).then_some(year)
}

/// Apply per-field fallbacks and produce a catalog entry.
pub fn build_track(path: &Path, meta: RawMetadata, settings: &CatalogSettings) -> Track {
    let title = meta.title.unwrap_or_else(|| {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string()
    });
    let artist = meta
        .artist
        .unwrap_or_else(|| settings.unknown_artist.clone());
    let album = meta.album.unwrap_or_else(|| settings.unknown_album.clone());
    let genre = if meta.genres.is_empty() {
        vec![settings.unknown_genre.clone()]
    } else {
        meta.genres
    };
    let year = meta.year.unwrap_or_else(|| settings.unknown_year.clone());

    let artwork = match meta.picture {
        Some(pic) if !pic.data.is_empty() => Artwork::Embedded {
            mime: pic
                .mime
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            data: Arc::from(pic.data),
        },
        _ => Artwork::Placeholder,
    };

    let mut track = Track {
        path: path.to_path_buf(),
        title,
        artist,
        artists: meta.artists,
        album,
        genre,
        year,
        track_number: meta.track_number.filter(|&n| n > 0),
        duration: meta.duration.unwrap_or(Duration::ZERO),
        artwork,
        dedupe_key: meta.isrc,
        display: String::new(),
    };
    track.display = track_label(
        &track,
        &settings.display_fields,
        &settings.display_separator,
    );
    track
}
