use std::env;
use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::ControlsSettings;
use crate::session::{Intent, PlaybackSession};

use super::model::App;

/// What the runtime should do in response to a key.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Session(Intent),
    AddPaths(Vec<PathBuf>),
    Quit,
}

/// Expand a leading `~` to the home directory.
fn expand_home(input: &str) -> PathBuf {
    match (input.strip_prefix('~'), env::var_os("HOME")) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
            PathBuf::from(home).join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(input),
    }
}

impl App {
    /// Translate one key press. Cursor movement is applied directly; anything
    /// that touches the session is returned as an action.
    pub fn handle_key(
        &mut self,
        key: KeyEvent,
        session: &PlaybackSession,
        controls: &ControlsSettings,
    ) -> Option<Action> {
        if self.is_prompting() {
            return self.handle_prompt_key(key);
        }

        let was_pending_g = std::mem::take(&mut self.pending_g);
        let len = session.len();
        let scrub = i64::try_from(controls.scrub_seconds).unwrap_or(i64::MAX);

        let intent = match key.code {
            KeyCode::Char('q') => return Some(Action::Quit),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Some(Action::Quit);
            }
            KeyCode::Char(' ') | KeyCode::Char('p') => Intent::TogglePlay,
            KeyCode::Char('l') => Intent::Next,
            KeyCode::Char('h') => Intent::Previous,
            KeyCode::Char('L') => Intent::SeekBy(scrub),
            KeyCode::Char('H') => Intent::SeekBy(-scrub),
            KeyCode::Char('+') | KeyCode::Char('=') => Intent::AdjustVolume(controls.volume_step),
            KeyCode::Char('-') => Intent::AdjustVolume(-controls.volume_step),
            KeyCode::Char('s') => Intent::ToggleShuffle,
            KeyCode::Char('r') => Intent::CycleRepeatMode,
            KeyCode::Char('i') => Intent::ToggleInfoOverlay,
            KeyCode::Enter => {
                if len == 0 {
                    return None;
                }
                self.follow_playback = true;
                Intent::Select(self.cursor)
            }
            KeyCode::Char('d') => {
                if len == 0 {
                    return None;
                }
                Intent::Remove(self.cursor)
            }
            KeyCode::Char('a') => {
                self.start_prompt();
                return None;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.next(len);
                return None;
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.prev();
                return None;
            }
            KeyCode::Char('g') => {
                if was_pending_g {
                    self.top();
                } else {
                    self.pending_g = true;
                }
                return None;
            }
            KeyCode::Char('G') => {
                self.bottom(len);
                return None;
            }
            _ => return None,
        };

        Some(Action::Session(intent))
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Esc => {
                self.take_prompt();
                None
            }
            KeyCode::Backspace => {
                self.pop_prompt_char();
                None
            }
            KeyCode::Enter => {
                let typed = self.take_prompt()?;
                let typed = typed.trim();
                if typed.is_empty() {
                    None
                } else {
                    Some(Action::AddPaths(vec![expand_home(typed)]))
                }
            }
            KeyCode::Char(c) if !c.is_control() => {
                self.push_prompt_char(c);
                None
            }
            _ => None,
        }
    }
}
