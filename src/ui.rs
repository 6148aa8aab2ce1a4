//! UI rendering helpers for the terminal user interface.
//!
//! This module renders a `PlaybackSession` and the `App` view state with
//! `ratatui`. It never mutates either.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Padding, Paragraph, Wrap},
};
use std::time::Duration;

use crate::app::{App, InputMode};
use crate::catalog::{Track, track_label};
use crate::config::{ControlsSettings, Settings, TimeField, UiSettings};
use crate::session::{PlaybackSession, TransportState};

/// Key bindings shown in the footer, in display order.
const CONTROLS: &[(&str, &str)] = &[
    ("space/p", "play/pause"),
    ("h/l", "prev/next"),
    ("j/k", "up/down"),
    ("gg/G", "top/bottom"),
    ("enter", "play selected"),
    ("d", "remove"),
    ("a", "add path"),
    ("+/-", "volume"),
    ("s", "shuffle"),
    ("r", "repeat"),
    ("i", "info"),
    ("q", "quit"),
];

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(controls: &ControlsSettings) -> String {
    let mut parts: Vec<String> = CONTROLS
        .iter()
        .map(|(k, v)| format!("[{k}] {v}"))
        .collect();
    parts.insert(
        2,
        format!("[H/L] scrub -/+{}s", controls.scrub_seconds),
    );
    parts.join(" | ")
}

/// Format a `Duration` as `m:ss`.
pub fn format_time(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Build the now-playing time text (elapsed/total/remaining) per `UiSettings`.
fn now_playing_time_text(elapsed: Duration, total: Duration, ui: &UiSettings) -> Option<String> {
    let known = !total.is_zero();
    let parts: Vec<String> = ui
        .now_playing_time_fields
        .iter()
        .filter_map(|f| match f {
            TimeField::Elapsed => Some(format_time(elapsed)),
            TimeField::Total => known.then(|| format_time(total)),
            TimeField::Remaining => {
                known.then(|| format!("-{}", format_time(total.saturating_sub(elapsed))))
            }
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(&ui.now_playing_time_separator))
    }
}

fn state_label(state: TransportState) -> &'static str {
    match state {
        TransportState::Empty => "Empty",
        TransportState::Paused => "Paused",
        TransportState::Playing => "Playing",
    }
}

/// The text of the status box.
pub fn status_text(session: &PlaybackSession, app: &App, ui: &UiSettings) -> String {
    let mut parts: Vec<String> = vec![state_label(session.state()).to_string()];

    if let Some(track) = session.current_track() {
        let song = track_label(track, &ui.now_playing_track_fields, &ui.now_playing_track_separator);
        match now_playing_time_text(session.elapsed, session.duration(), ui) {
            Some(time) => parts.push(format!("Song: {song} [{time}]")),
            None => parts.push(format!("Song: {song}")),
        }
        parts.push(format!(
            "Song {} of {}",
            session.current_index + 1,
            session.len()
        ));
    } else {
        parts.push("No tracks, press [a] to add some".to_string());
    }

    parts.push(session.repeat_mode.label().to_string());
    parts.push(format!(
        "Shuffle: {}",
        if session.shuffle { "ON" } else { "OFF" }
    ));
    parts.push(format!("Volume: {:.0}%", session.volume * 100.0));

    if let Some(notice) = &app.notice {
        parts.push(notice.clone());
    }

    parts.join(" • ")
}

/// Format a duration, rounding up partial seconds, showing total seconds.
fn format_duration_ceil(d: Duration) -> String {
    if d.is_zero() {
        return "-".to_string();
    }

    let mut total_secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        total_secs = total_secs.saturating_add(1);
    }
    format!("{}:{:02} ({}s)", total_secs / 60, total_secs % 60, total_secs)
}

/// The text of the track info overlay.
pub fn info_text(track: &Track) -> String {
    let track_number = track
        .track_number
        .map_or_else(|| "-".to_string(), |n| n.to_string());
    format!(
        "Title: {}\nArtist: {}\nAlbum: {}\nGenre: {}\nYear: {}\nTrack: {}\nDuration: {}\nArtwork: {}\nPath: {}",
        track.title,
        track.artist,
        track.album,
        track.genre.join(", "),
        track.year,
        track_number,
        format_duration_ceil(track.duration),
        track.artwork.describe(),
        track.path.display()
    )
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(3);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width: width.min(r.width),
        height: height.min(r.height),
    }
}

/// Visible window `[start, end)` of `total` rows keeping `selected` centered.
fn visible_window(total: usize, height: usize, selected: usize) -> (usize, usize) {
    if total <= height || height == 0 {
        return (0, total);
    }
    let half = height / 2;
    let mut start = selected.saturating_sub(half);
    if start + height > total {
        start = total - height;
    }
    (start, start + height)
}

/// Rows of the playlist actually visible inside its bordered block.
fn playlist_window(total: usize, area: Rect, cursor: usize) -> (usize, usize) {
    visible_window(total, area.height.saturating_sub(2) as usize, cursor)
}

fn left_padded(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .padding(Padding {
            left: 1,
            right: 0,
            top: 0,
            bottom: 0,
        })
}

/// Render the entire UI into the provided `frame`.
pub fn draw(frame: &mut Frame, session: &PlaybackSession, app: &App, settings: &Settings) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(settings.ui.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" reprise ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    // Status box
    let status = Paragraph::new(status_text(session, app, &settings.ui))
        .block(left_padded(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status, chunks[1]);

    // Playlist. Only build ListItems for the visible window.
    {
        let total = session.len();
        let (start, end) = playlist_window(total, chunks[2], app.cursor);

        let items: Vec<ListItem> = session.playlist[start..end]
            .iter()
            .enumerate()
            .map(|(offset, track)| {
                let i = start + offset;
                if i == session.current_index {
                    let marker = if session.is_playing { "▶" } else { "‖" };
                    ListItem::new(format!("{marker} {}", track.display))
                        .style(Style::default().add_modifier(Modifier::BOLD))
                } else {
                    ListItem::new(format!("  {}", track.display))
                }
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(" playlist "))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        if total > 0 {
            state.select(Some(app.cursor.min(total - 1) - start));
        }
        frame.render_stateful_widget(list, chunks[2], &mut state);
    }

    // Info overlay, kept inside the list area.
    if session.info_overlay_visible {
        let popup_area = centered_rect_sized(72, 11, chunks[2]);
        frame.render_widget(Clear, popup_area);

        let text = session
            .current_track()
            .map_or_else(|| "No track loaded".to_string(), |t| info_text(t));
        let info = Paragraph::new(text)
            .block(left_padded(" info (i closes) "))
            .wrap(Wrap { trim: true });
        frame.render_widget(info, popup_area);
    }

    // Footer, replaced by the prompt while adding a path.
    match &app.mode {
        InputMode::AddPath(buf) => {
            let prompt = Paragraph::new(format!("{buf}▏"))
                .block(left_padded(" add file or directory (enter adds, esc cancels) "));
            frame.render_widget(prompt, chunks[3]);
        }
        InputMode::Normal => {
            let footer = Paragraph::new(controls_text(&settings.controls))
                .block(left_padded(" controls "))
                .wrap(Wrap { trim: true });
            frame.render_widget(footer, chunks[3]);
        }
    }
}
