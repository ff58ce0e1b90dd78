use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, info};

use crate::difficulty::Difficulty;
use crate::loader::{LoadEvent, TextLoader};
use crate::runtime::AppEvent;
use crate::session::TypingSession;

/// Whether there is text to type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextStatus {
    Loading,
    Ready,
    Unavailable(String),
}

/// Presentation-side state wrapped around a typing session.
pub struct App {
    pub session: TypingSession,
    pub selected_difficulty: Difficulty,
    pub status: TextStatus,
    pub focused: bool,
    pub should_quit: bool,
    loader: Option<TextLoader>,
}

impl App {
    /// Starts with no text and immediately asks the loader for some.
    pub fn new(loader: TextLoader, difficulty: Difficulty) -> Self {
        let mut app = Self {
            session: TypingSession::new("", difficulty),
            selected_difficulty: difficulty,
            status: TextStatus::Loading,
            focused: true,
            should_quit: false,
            loader: Some(loader),
        };
        app.request_text();
        app
    }

    /// Fixed text; difficulty changes and new-text requests are ignored.
    /// Line breaks and tabs in `prompt` collapse to single spaces, since
    /// only printable keys reach the session.
    pub fn with_prompt(prompt: &str, difficulty: Difficulty) -> Self {
        let words: Vec<&str> = prompt.split_whitespace().collect();
        Self {
            session: TypingSession::from_words(&words, difficulty),
            selected_difficulty: difficulty,
            status: TextStatus::Ready,
            focused: true,
            should_quit: false,
            loader: None,
        }
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Focus(focused) => self.focused = focused,
            AppEvent::Resize => {}
            AppEvent::Tick => self.poll_loader(),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        // any key press means the user is back
        self.focused = true;

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true
            }
            KeyCode::Backspace => {
                if self.status != TextStatus::Loading {
                    self.session.delete_last_character();
                }
            }
            KeyCode::Tab => self.reset(),
            KeyCode::Enter => self.request_text(),
            KeyCode::Left => self.change_difficulty(self.selected_difficulty.easier()),
            KeyCode::Right => self.change_difficulty(self.selected_difficulty.harder()),
            KeyCode::Char(c) => {
                if key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    return;
                }
                if self.status != TextStatus::Loading {
                    self.session.accept_character(c);
                }
            }
            _ => {}
        }
    }

    pub fn reset(&mut self) {
        self.session.reset();
    }

    /// Selecting a level is only possible before the attempt has started.
    pub fn change_difficulty(&mut self, difficulty: Difficulty) {
        if self.session.has_started() {
            debug!("difficulty locked while an attempt is running");
            return;
        }
        if self.loader.is_none() || difficulty == self.selected_difficulty {
            return;
        }

        info!(from = %self.selected_difficulty, to = %difficulty, "difficulty changed");
        self.selected_difficulty = difficulty;
        self.request_text();
    }

    /// Asks for fresh text at the selected difficulty.
    pub fn request_text(&mut self) {
        if let Some(loader) = self.loader.as_mut() {
            loader.request(self.selected_difficulty);
            self.status = TextStatus::Loading;
        }
    }

    pub fn poll_loader(&mut self) {
        let event = match self.loader.as_mut().and_then(TextLoader::poll) {
            Some(event) => event,
            None => return,
        };
        self.apply_load_event(event);
    }

    pub fn apply_load_event(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::Loaded { difficulty, words } => {
                self.session.load_text(difficulty, &words);
                self.selected_difficulty = difficulty;
                self.status = TextStatus::Ready;
            }
            LoadEvent::Failed { error, .. } => {
                // the previous text, if any, stays authoritative
                if self.session.has_text() {
                    self.selected_difficulty = self.session.difficulty();
                }
                self.status = TextStatus::Unavailable(error.to_string());
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == TextStatus::Loading
    }
}
