//! Headless console surfaces.
//!
//! Screens render to text lines. [`Chrome`] holds the state every screen
//! shares: the busy indicator and a dismissible error notice.

use std::sync::atomic::{AtomicBool, Ordering};

use armature::PresentationError;
use parking_lot::Mutex;

#[derive(Debug, Default)]
pub struct Chrome {
    busy: AtomicBool,
    notice: Mutex<Option<String>>,
}

impl Chrome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::SeqCst);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn set_error(&self, error: &PresentationError) {
        *self.notice.lock() = Some(error.to_string());
    }

    pub fn notice(&self) -> Option<String> {
        self.notice.lock().clone()
    }

    /// Clear the notice. Returns `false` when there was none.
    pub fn dismiss(&self) -> bool {
        self.notice.lock().take().is_some()
    }

    /// Title bar, busy indicator and notice.
    pub fn header(&self, title: &str) -> Vec<String> {
        let mut lines = vec![format!("== {title} ==")];
        if self.is_busy() {
            lines.push("(loading...)".into());
        }
        if let Some(notice) = self.notice() {
            lines.push(format!("! {notice}  [back to dismiss]"));
        }
        lines
    }
}
