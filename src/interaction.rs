//! Runtime toggles driven by key presses.

use tracing::info;

use crate::types::{LandmarkIndex, SelectionMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    ToggleMode,
    CycleLandmark,
    Quit,
}

impl KeyEvent {
    /// `q` quits, `d` toggles the selection mode, `l` cycles the landmark.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'q' => Some(KeyEvent::Quit),
            'd' => Some(KeyEvent::ToggleMode),
            'l' => Some(KeyEvent::CycleLandmark),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// The only state carried from one frame to the next. Owned by the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionState {
    pub mode: SelectionMode,
    pub landmark_index: LandmarkIndex,
    finished: bool,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self {
            mode: SelectionMode::Centroid,
            landmark_index: LandmarkIndex::default(),
            finished: false,
        }
    }
}

impl InteractionState {
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Apply one key event. Once quit, further events are ignored.
    pub fn handle(&mut self, event: KeyEvent) -> Control {
        if self.finished {
            return Control::Quit;
        }
        match event {
            KeyEvent::ToggleMode => {
                self.mode = self.mode.toggled();
                info!(mode = ?self.mode, "selection mode changed");
            }
            KeyEvent::CycleLandmark => {
                self.landmark_index = self.landmark_index.next();
                info!(landmark_index = self.landmark_index.get(), "landmark changed");
            }
            KeyEvent::Quit => {
                self.finished = true;
                return Control::Quit;
            }
        }
        Control::Continue
    }
}
