use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::tempdir;

use super::*;
use crate::catalog::{Catalog, MetadataExtractor, RawMetadata, Track, build_track};
use crate::config::CatalogSettings;
use crate::error::{AudioError, CatalogError};

fn rng() -> StdRng {
    StdRng::seed_from_u64(0x5eed)
}

fn meta(title: &str, key: Option<&str>) -> RawMetadata {
    RawMetadata {
        title: Some(title.to_string()),
        isrc: key.map(str::to_string),
        duration: Some(Duration::from_secs(200)),
        ..RawMetadata::default()
    }
}

fn track(title: &str, key: Option<&str>) -> Track {
    let path = format!("/m/{title}.mp3");
    build_track(Path::new(&path), meta(title, key), &CatalogSettings::default())
}

fn keyed(titles: &[&str]) -> Vec<Track> {
    titles.iter().map(|&t| track(t, Some(t))).collect()
}

fn session_with(titles: &[&str]) -> PlaybackSession {
    PlaybackSession::default()
        .apply(Intent::Append(keyed(titles)), &mut rng())
        .session
}

fn at(titles: &[&str], index: usize, repeat_mode: RepeatMode) -> PlaybackSession {
    PlaybackSession {
        current_index: index,
        is_playing: true,
        elapsed: Duration::from_secs(42),
        repeat_mode,
        ..session_with(titles)
    }
}

fn titles(s: &PlaybackSession) -> Vec<&str> {
    s.playlist.iter().map(|t| t.title.as_str()).collect()
}

fn loaded(effects: &[Effect]) -> Vec<(&str, bool)> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Load { track, autoplay } => Some((track.title.as_str(), *autoplay)),
            _ => None,
        })
        .collect()
}

#[test]
fn first_batch_selects_first_track_without_playing() {
    let t = PlaybackSession::default().apply(Intent::Append(keyed(&["A", "B"])), &mut rng());

    assert_eq!(t.session.current_index, 0);
    assert!(!t.session.is_playing);
    assert_eq!(t.session.state(), TransportState::Paused);
    assert_eq!(t.session.total_duration, Duration::from_secs(200));
    assert_eq!(loaded(&t.effects), vec![("A", false)]);
}

#[test]
fn later_batches_append_without_touching_the_selection() {
    let s = PlaybackSession {
        current_index: 1,
        is_playing: true,
        ..session_with(&["A", "B"])
    };
    let t = s.apply(Intent::Append(keyed(&["C"])), &mut rng());

    assert_eq!(titles(&t.session), vec!["A", "B", "C"]);
    assert_eq!(t.session.current_index, 1);
    assert!(t.session.is_playing);
    assert!(t.effects.is_empty());
}

#[test]
fn appending_the_same_batch_twice_adds_nothing_the_second_time() {
    let once = session_with(&["A", "B", "C"]);
    let twice = once.apply(Intent::Append(keyed(&["A", "B", "C"])), &mut rng());

    assert_eq!(twice.session, once);
    assert!(twice.effects.is_empty());
}

#[test]
fn tracks_without_a_key_are_never_deduplicated() {
    let s = PlaybackSession::default()
        .apply(
            Intent::Append(vec![track("A", None), track("A", None)]),
            &mut rng(),
        )
        .session;
    let s = s
        .apply(Intent::Append(vec![track("A", None)]), &mut rng())
        .session;
    assert_eq!(s.len(), 3);
}

#[test]
fn empty_batch_into_empty_playlist_stays_empty() {
    let t = PlaybackSession::default().apply(Intent::Append(Vec::new()), &mut rng());
    assert_eq!(t.session.state(), TransportState::Empty);
    assert!(t.effects.is_empty());
}

#[test]
fn next_and_previous_wrap_around() {
    let t = at(&["A", "B", "C"], 2, RepeatMode::QueueRepeat).apply(Intent::Next, &mut rng());
    assert_eq!(t.session.current_index, 0);
    assert!(t.session.is_playing);
    assert_eq!(t.session.elapsed, Duration::ZERO);
    assert_eq!(loaded(&t.effects), vec![("A", true)]);

    let t = at(&["A", "B", "C"], 0, RepeatMode::QueueRepeat).apply(Intent::Previous, &mut rng());
    assert_eq!(t.session.current_index, 2);
    assert_eq!(loaded(&t.effects), vec![("C", true)]);
}

#[test]
fn next_starts_playback_from_paused() {
    let s = session_with(&["A", "B"]);
    let t = s.apply(Intent::Next, &mut rng());
    assert_eq!(t.session.current_index, 1);
    assert!(t.session.is_playing);
}

#[test]
fn shuffled_next_is_uniform_over_the_whole_playlist() {
    let mut s = PlaybackSession {
        shuffle: true,
        ..at(&["A", "B", "C"], 0, RepeatMode::QueueRepeat)
    };
    let mut r = rng();
    let mut seen = HashSet::new();
    let mut repeated_current = false;

    for _ in 0..300 {
        let before = s.current_index;
        let t = s.apply(Intent::Next, &mut r);
        assert!(t.session.current_index < 3);
        assert!(t.session.is_playing);
        repeated_current |= t.session.current_index == before;
        seen.insert(t.session.current_index);
        s = t.session;
    }

    assert_eq!(seen.len(), 3);
    assert!(repeated_current);
}

#[test]
fn track_end_follows_the_repeat_mode() {
    let abc = ["A", "B", "C"];

    let t = at(&abc, 2, RepeatMode::QueueRepeat).apply(Intent::TrackEnded, &mut rng());
    assert_eq!(t.session.current_index, 0);
    assert!(t.session.is_playing);
    assert_eq!(loaded(&t.effects), vec![("A", true)]);

    let t = at(&abc, 2, RepeatMode::TrackRepeat).apply(Intent::TrackEnded, &mut rng());
    assert_eq!(t.session.current_index, 2);
    assert!(t.session.is_playing);
    assert_eq!(t.session.elapsed, Duration::ZERO);
    assert_eq!(loaded(&t.effects), vec![("C", true)]);

    let t = at(&abc, 2, RepeatMode::NoRepeat).apply(Intent::TrackEnded, &mut rng());
    assert_eq!(t.session.current_index, 0);
    assert!(!t.session.is_playing);
    assert_eq!(t.session.elapsed, Duration::ZERO);
    assert_eq!(loaded(&t.effects), vec![("A", false)]);
}

#[test]
fn no_repeat_before_the_last_track_just_advances() {
    let t = at(&["A", "B", "C"], 1, RepeatMode::NoRepeat).apply(Intent::TrackEnded, &mut rng());
    assert_eq!(t.session.current_index, 2);
    assert!(t.session.is_playing);
}

#[test]
fn removing_before_the_current_track_keeps_pointing_at_it() {
    let t = at(&["A", "B", "C"], 2, RepeatMode::QueueRepeat).apply(Intent::Remove(0), &mut rng());
    assert_eq!(titles(&t.session), vec!["B", "C"]);
    assert_eq!(t.session.current_index, 1);
    assert_eq!(t.session.current_track().unwrap().title, "C");
    assert!(t.session.is_playing);
    assert!(t.effects.is_empty());
}

#[test]
fn removing_after_the_current_track_changes_nothing_else() {
    let t = at(&["A", "B", "C"], 0, RepeatMode::QueueRepeat).apply(Intent::Remove(2), &mut rng());
    assert_eq!(titles(&t.session), vec!["A", "B"]);
    assert_eq!(t.session.current_index, 0);
    assert!(t.session.is_playing);
}

#[test]
fn removing_the_current_track_stops_and_loads_the_neighbour_paused() {
    let t = at(&["A", "B", "C"], 0, RepeatMode::QueueRepeat).apply(Intent::Remove(0), &mut rng());
    assert_eq!(t.session.current_index, 0);
    assert_eq!(t.session.current_track().unwrap().title, "B");
    assert!(!t.session.is_playing);
    assert_eq!(t.session.elapsed, Duration::ZERO);
    assert_eq!(t.effects.first(), Some(&Effect::Stop));
    assert_eq!(loaded(&t.effects), vec![("B", false)]);

    let t = at(&["A", "B", "C"], 2, RepeatMode::QueueRepeat).apply(Intent::Remove(2), &mut rng());
    assert_eq!(t.session.current_index, 1);
    assert_eq!(t.session.current_track().unwrap().title, "B");
}

#[test]
fn removing_the_last_entry_empties_the_session() {
    let t = at(&["A"], 0, RepeatMode::QueueRepeat).apply(Intent::Remove(0), &mut rng());
    assert_eq!(t.session.state(), TransportState::Empty);
    assert_eq!(t.session.current_index, 0);
    assert_eq!(t.effects, vec![Effect::Stop]);
}

#[test]
fn out_of_range_indices_are_ignored() {
    let s = at(&["A", "B"], 1, RepeatMode::QueueRepeat);
    for intent in [Intent::Remove(2), Intent::Select(5)] {
        let t = s.apply(intent, &mut rng());
        assert_eq!(t.session, s);
        assert!(t.effects.is_empty());
    }
}

#[test]
fn transport_on_an_empty_playlist_is_a_no_op() {
    let empty = PlaybackSession::default();
    let intents = vec![
        Intent::TogglePlay,
        Intent::Play,
        Intent::Pause,
        Intent::Stop,
        Intent::Next,
        Intent::Previous,
        Intent::TrackEnded,
        Intent::Select(0),
        Intent::Remove(0),
        Intent::Seek(Duration::from_secs(3)),
        Intent::SeekBy(-5),
        Intent::DurationKnown(Duration::from_secs(3)),
        Intent::Position(Duration::from_secs(3)),
        Intent::SourceFailed,
    ];
    for intent in intents {
        let t = empty.apply(intent.clone(), &mut rng());
        assert_eq!(t.session, empty, "{intent:?} changed an empty session");
        assert!(t.effects.is_empty(), "{intent:?} produced effects");
    }
}

#[test]
fn policies_can_change_while_empty() {
    let s = PlaybackSession::default();
    let s = s.apply(Intent::SetVolume(0.3), &mut rng()).session;
    let s = s.apply(Intent::ToggleShuffle, &mut rng()).session;
    let s = s.apply(Intent::CycleRepeatMode, &mut rng()).session;
    let s = s.apply(Intent::ToggleInfoOverlay, &mut rng()).session;

    assert_eq!(s.volume, 0.3);
    assert!(s.shuffle);
    assert_eq!(s.repeat_mode, RepeatMode::TrackRepeat);
    assert!(s.info_overlay_visible);
}

#[test]
fn repeat_mode_cycle_closes_after_three_steps() {
    let mut s = PlaybackSession::default();
    let mut modes = Vec::new();
    for _ in 0..3 {
        s = s.apply(Intent::CycleRepeatMode, &mut rng()).session;
        modes.push(s.repeat_mode);
    }
    assert_eq!(
        modes,
        vec![
            RepeatMode::TrackRepeat,
            RepeatMode::NoRepeat,
            RepeatMode::QueueRepeat
        ]
    );
}

#[test]
fn toggle_play_emits_matching_effects() {
    let s = session_with(&["A"]);
    let t = s.apply(Intent::TogglePlay, &mut rng());
    assert!(t.session.is_playing);
    assert_eq!(t.effects, vec![Effect::Play]);

    let t = t.session.apply(Intent::TogglePlay, &mut rng());
    assert!(!t.session.is_playing);
    assert_eq!(t.effects, vec![Effect::Pause]);

    // Explicit play/pause are idempotent.
    let t = t.session.apply(Intent::Pause, &mut rng());
    assert!(t.effects.is_empty());
}

#[test]
fn stop_rewinds_and_pauses() {
    let t = at(&["A"], 0, RepeatMode::QueueRepeat).apply(Intent::Stop, &mut rng());
    assert!(!t.session.is_playing);
    assert_eq!(t.session.elapsed, Duration::ZERO);
    assert_eq!(t.effects, vec![Effect::Pause, Effect::Seek(Duration::ZERO)]);
}

#[test]
fn seeking_is_clamped_to_the_known_duration() {
    let s = at(&["A"], 0, RepeatMode::QueueRepeat);

    let t = s.apply(Intent::Seek(Duration::from_secs(500)), &mut rng());
    assert_eq!(t.session.elapsed, Duration::from_secs(200));
    assert_eq!(t.effects, vec![Effect::Seek(Duration::from_secs(200))]);

    let t = s.apply(Intent::SeekBy(-60), &mut rng());
    assert_eq!(t.session.elapsed, Duration::ZERO);

    let t = s.apply(Intent::SeekBy(8), &mut rng());
    assert_eq!(t.session.elapsed, Duration::from_secs(50));
}

#[test]
fn volume_is_clamped_and_nan_is_ignored() {
    let s = session_with(&["A"]);

    let t = s.apply(Intent::SetVolume(1.7), &mut rng());
    assert_eq!(t.session.volume, 1.0);
    assert_eq!(t.effects, vec![Effect::SetVolume(1.0)]);

    let t = s.apply(Intent::AdjustVolume(-3.0), &mut rng());
    assert_eq!(t.session.volume, 0.0);

    let t = s.apply(Intent::SetVolume(f32::NAN), &mut rng());
    assert_eq!(t.session.volume, 1.0);
    assert!(t.effects.is_empty());
}

#[test]
fn output_reports_update_time_fields() {
    let s = session_with(&["A"]);
    let s = s
        .apply(Intent::DurationKnown(Duration::from_secs(61)), &mut rng())
        .session;
    let s = s
        .apply(Intent::Position(Duration::from_secs(7)), &mut rng())
        .session;
    assert_eq!(s.total_duration, Duration::from_secs(61));
    assert_eq!(s.duration(), Duration::from_secs(61));
    assert_eq!(s.elapsed, Duration::from_secs(7));
}

#[test]
fn playing_after_a_failed_source_reloads_it() {
    let failed = session_with(&["A", "B"])
        .apply(Intent::SourceFailed, &mut rng())
        .session;
    assert!(!failed.source_loaded);
    assert_eq!(failed.state(), TransportState::Paused);

    for intent in [Intent::TogglePlay, Intent::Play] {
        let t = failed.apply(intent.clone(), &mut rng());
        assert!(t.session.is_playing, "{intent:?}");
        assert!(t.session.source_loaded, "{intent:?}");
        assert_eq!(t.session.current_index, 0);
        assert_eq!(loaded(&t.effects), vec![("A", true)], "{intent:?}");
        assert!(!t.effects.contains(&Effect::Play), "{intent:?}");
    }
}

// ----- Player -----

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Load(String, bool, u64),
    Play,
    Pause,
    Stop,
    Seek(Duration),
    Volume(f32),
}

#[derive(Default)]
struct RecordingOutput {
    calls: Vec<Call>,
}

impl MediaOutput for RecordingOutput {
    fn load(&mut self, track: &Track, autoplay: bool, generation: u64) -> Result<(), AudioError> {
        self.calls
            .push(Call::Load(track.title.clone(), autoplay, generation));
        Ok(())
    }
    fn play(&mut self) -> Result<(), AudioError> {
        self.calls.push(Call::Play);
        Ok(())
    }
    fn pause(&mut self) -> Result<(), AudioError> {
        self.calls.push(Call::Pause);
        Ok(())
    }
    fn stop(&mut self) -> Result<(), AudioError> {
        self.calls.push(Call::Stop);
        Ok(())
    }
    fn seek(&mut self, to: Duration) -> Result<(), AudioError> {
        self.calls.push(Call::Seek(to));
        Ok(())
    }
    fn set_volume(&mut self, volume: f32) -> Result<(), AudioError> {
        self.calls.push(Call::Volume(volume));
        Ok(())
    }
}

/// Output whose device has gone away.
struct DeadOutput;

impl MediaOutput for DeadOutput {
    fn load(&mut self, _: &Track, _: bool, _: u64) -> Result<(), AudioError> {
        Err(AudioError::Disconnected)
    }
    fn play(&mut self) -> Result<(), AudioError> {
        Err(AudioError::Disconnected)
    }
    fn pause(&mut self) -> Result<(), AudioError> {
        Err(AudioError::Disconnected)
    }
    fn stop(&mut self) -> Result<(), AudioError> {
        Err(AudioError::Disconnected)
    }
    fn seek(&mut self, _: Duration) -> Result<(), AudioError> {
        Err(AudioError::Disconnected)
    }
    fn set_volume(&mut self, _: f32) -> Result<(), AudioError> {
        Err(AudioError::Disconnected)
    }
}

fn player_with(titles: &[&str]) -> Player<RecordingOutput> {
    let mut p =
        Player::with_rng(RecordingOutput::default(), PlaybackSession::default(), rng()).unwrap();
    p.dispatch(Intent::Append(keyed(titles))).unwrap();
    p
}

#[test]
fn player_pushes_initial_volume_and_forwards_effects_in_order() {
    let session = PlaybackSession {
        volume: 0.5,
        ..PlaybackSession::default()
    };
    let mut p = Player::with_rng(RecordingOutput::default(), session, rng()).unwrap();
    p.dispatch(Intent::Append(keyed(&["A", "B"]))).unwrap();
    p.dispatch(Intent::Next).unwrap();
    p.dispatch(Intent::TogglePlay).unwrap();

    assert_eq!(
        p.output().calls,
        vec![
            Call::Volume(0.5),
            Call::Load("A".into(), false, 1),
            Call::Load("B".into(), true, 2),
            Call::Pause,
        ]
    );
    assert_eq!(p.generation(), 2);
}

#[test]
fn player_drops_events_from_replaced_sources() {
    let mut p = player_with(&["A", "B", "C"]);
    p.dispatch(Intent::Select(1)).unwrap();
    let current = p.generation();

    // The first source reports its end late; it must not advance the playlist.
    p.notify(MediaEvent::new(current - 1, MediaEventKind::Ended))
        .unwrap();
    p.notify(MediaEvent::new(
        current - 1,
        MediaEventKind::Position(Duration::from_secs(99)),
    ))
    .unwrap();
    assert_eq!(p.session().current_index, 1);
    assert_eq!(p.session().elapsed, Duration::ZERO);

    p.notify(MediaEvent::new(
        current,
        MediaEventKind::Position(Duration::from_secs(3)),
    ))
    .unwrap();
    assert_eq!(p.session().elapsed, Duration::from_secs(3));

    p.notify(MediaEvent::new(current, MediaEventKind::Ended))
        .unwrap();
    assert_eq!(p.session().current_index, 2);
    assert_eq!(p.generation(), current + 1);
}

#[test]
fn player_pauses_when_the_source_fails() {
    let mut p = player_with(&["A"]);
    p.dispatch(Intent::Play).unwrap();
    let generation = p.generation();
    p.notify(MediaEvent::new(generation, MediaEventKind::Failed))
        .unwrap();
    assert_eq!(p.session().state(), TransportState::Paused);
}

#[test]
fn player_reloads_a_failed_source_and_keeps_following_the_repeat_mode() {
    let mut p = player_with(&["A", "B"]);
    let failed = p.generation();
    p.notify(MediaEvent::new(failed, MediaEventKind::Failed))
        .unwrap();

    p.dispatch(Intent::TogglePlay).unwrap();
    assert_eq!(p.session().state(), TransportState::Playing);
    assert_eq!(p.generation(), failed + 1);
    assert_eq!(
        p.output().calls.last(),
        Some(&Call::Load("A".into(), true, failed + 1))
    );

    // The reloaded source ends normally and the queue moves on.
    p.notify(MediaEvent::new(failed + 1, MediaEventKind::Ended))
        .unwrap();
    assert_eq!(p.session().current_index, 1);
    assert!(p.session().is_playing);
}

#[test]
fn player_reports_a_dead_output() {
    assert!(matches!(
        Player::new(DeadOutput, PlaybackSession::default()),
        Err(AudioError::Disconnected)
    ));
}

#[test]
fn player_remove_stops_the_output_before_loading_the_neighbour() {
    let mut p = player_with(&["A", "B"]);
    p.dispatch(Intent::Play).unwrap();
    p.remove(0).unwrap();

    assert_eq!(titles(p.session()), vec!["B"]);
    assert!(!p.session().is_playing);
    assert_eq!(
        p.output().calls[p.output().calls.len() - 2..],
        [Call::Stop, Call::Load("B".into(), false, 2)]
    );
}

struct TableExtractor(HashMap<PathBuf, RawMetadata>);

impl MetadataExtractor for TableExtractor {
    fn extract(&self, path: &Path) -> Result<RawMetadata, CatalogError> {
        self.0
            .get(path)
            .cloned()
            .ok_or_else(|| CatalogError::NotAFile(path.to_path_buf()))
    }
}

#[test]
fn ingest_appends_survivors_and_deduplicates_repeated_batches() {
    let dir = tempdir().unwrap();
    let mut table = HashMap::new();
    for name in ["a", "b", "c", "d", "e"] {
        let path = dir.path().join(format!("{name}.mp3"));
        fs::write(&path, b"stub").unwrap();
        // d and e fail extraction.
        if name < "d" {
            table.insert(path, meta(&name.to_uppercase(), Some(name)));
        }
    }
    let catalog = Catalog::new(TableExtractor(table), CatalogSettings::default());

    let mut p =
        Player::with_rng(RecordingOutput::default(), PlaybackSession::default(), rng()).unwrap();
    let selection = [dir.path().to_path_buf()];

    assert_eq!(p.ingest(&catalog, &selection).unwrap(), 3);
    assert_eq!(titles(p.session()), vec!["A", "B", "C"]);
    assert_eq!(p.session().current_index, 0);
    assert!(!p.session().is_playing);

    assert_eq!(p.ingest(&catalog, &selection).unwrap(), 0);
    assert_eq!(p.session().len(), 3);
    assert_eq!(
        p.output().calls,
        vec![Call::Volume(1.0), Call::Load("A".into(), false, 1)]
    );
}

// ----- Invariants under arbitrary operation sequences -----

fn arbitrary_intent() -> impl Strategy<Value = Intent> {
    prop_oneof![
        (0usize..4).prop_map(|n| {
            Intent::Append(
                (0..n)
                    .map(|i| track(&format!("t{i}"), Some(&format!("k{i}"))))
                    .collect(),
            )
        }),
        (0usize..8).prop_map(Intent::Remove),
        (0usize..8).prop_map(Intent::Select),
        (0u8..8).prop_map(|op| match op {
            0 => Intent::TogglePlay,
            1 => Intent::Stop,
            2 => Intent::Next,
            3 => Intent::Previous,
            4 => Intent::TrackEnded,
            5 => Intent::ToggleShuffle,
            6 => Intent::CycleRepeatMode,
            _ => Intent::SourceFailed,
        }),
        (0u64..400).prop_map(|s| Intent::Seek(Duration::from_secs(s))),
        (-30i64..30).prop_map(Intent::SeekBy),
        (-1.0f32..2.0).prop_map(Intent::SetVolume),
    ]
}

proptest! {
    /// The selection always points into the playlist and a load is always
    /// for the track the session ends up pointing at.
    #[test]
    fn session_invariants_hold(
        seed in any::<u64>(),
        intents in prop::collection::vec(arbitrary_intent(), 1..60)
    ) {
        let mut r = StdRng::seed_from_u64(seed);
        let mut s = PlaybackSession::default();

        for intent in intents {
            let t = s.apply(intent, &mut r);
            s = t.session;

            if s.is_empty() {
                prop_assert_eq!(s.current_index, 0);
                prop_assert!(!s.is_playing);
            } else {
                prop_assert!(s.current_index < s.len());
            }
            prop_assert!(!s.is_playing || s.source_loaded);
            prop_assert!((0.0..=1.0).contains(&s.volume));
            prop_assert!(s.elapsed <= s.total_duration || s.total_duration.is_zero());

            if let Some(Effect::Load { track, autoplay }) = t
                .effects
                .iter()
                .rev()
                .find(|e| matches!(e, Effect::Load { .. }))
            {
                prop_assert_eq!(Some(track), s.current_track());
                prop_assert_eq!(*autoplay, s.is_playing);
            }
        }
    }
}
