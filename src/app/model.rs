//! View-state types: `App` and `InputMode`.

use crate::session::PlaybackSession;

/// What the keyboard is currently driving.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// Typing a file or directory to add; holds the text entered so far.
    AddPath(String),
}

/// The view model of the TUI.
#[derive(Debug, Clone)]
pub struct App {
    /// Highlighted playlist row.
    pub cursor: usize,
    /// Whether the cursor jumps to the current track when it changes.
    pub follow_playback: bool,
    pub mode: InputMode,
    /// Short message shown in the status box (e.g. ingest results).
    pub notice: Option<String>,
    pub(super) pending_g: bool,
    last_current: Option<usize>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            cursor: 0,
            follow_playback: true,
            mode: InputMode::Normal,
            notice: None,
            pending_g: false,
            last_current: None,
        }
    }

    /// Reconcile the cursor with a freshly published session: keep it inside
    /// the playlist and follow the current track when it moves.
    pub fn sync(&mut self, session: &PlaybackSession) {
        let current = (!session.is_empty()).then_some(session.current_index);
        if self.follow_playback && current != self.last_current {
            if let Some(i) = current {
                self.cursor = i;
            }
        }
        self.last_current = current;
        self.cursor = self.cursor.min(session.len().saturating_sub(1));
    }

    /// Move the cursor down one row.
    pub fn next(&mut self, len: usize) {
        self.follow_playback = false;
        if self.cursor + 1 < len {
            self.cursor += 1;
        }
    }

    /// Move the cursor up one row.
    pub fn prev(&mut self) {
        self.follow_playback = false;
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn top(&mut self) {
        self.follow_playback = false;
        self.cursor = 0;
    }

    pub fn bottom(&mut self, len: usize) {
        self.follow_playback = false;
        self.cursor = len.saturating_sub(1);
    }

    pub fn is_prompting(&self) -> bool {
        matches!(self.mode, InputMode::AddPath(_))
    }

    pub fn start_prompt(&mut self) {
        self.mode = InputMode::AddPath(String::new());
    }

    pub fn push_prompt_char(&mut self, c: char) {
        if let InputMode::AddPath(buf) = &mut self.mode {
            buf.push(c);
        }
    }

    pub fn pop_prompt_char(&mut self) {
        if let InputMode::AddPath(buf) = &mut self.mode {
            buf.pop();
        }
    }

    /// Leave the prompt, returning what was typed.
    pub fn take_prompt(&mut self) -> Option<String> {
        match std::mem::take(&mut self.mode) {
            InputMode::AddPath(buf) => Some(buf),
            InputMode::Normal => None,
        }
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }
}
