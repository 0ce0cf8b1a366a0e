//! The presentation-surface capability.
//!
//! Every surface can show a busy state and an error notice; there is no
//! "plain" versus "specialised" kind to branch on. Drawing is the surface's
//! business; the core only pushes state into it.

use std::sync::Arc;

use futures::StreamExt;

use crate::container::StateContainer;
use crate::error::PresentationError;
use crate::navigation::NavigationStack;

/// A user gesture delivered to whatever surface is visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gesture {
    Refresh,
    /// Tap on the n-th row of a flat list.
    Select(usize),
    /// Tap on a row of a sectioned list.
    SelectRow { section: usize, row: usize },
    /// Switch to the tab with this title.
    Tab(String),
    /// A named action button.
    Action(String),
    Back,
}

pub trait Surface: Send + Sync {
    fn title(&self) -> String;

    fn show_busy(&self, busy: bool);

    fn show_error(&self, error: &PresentationError);

    /// Handle a gesture. Returns `false` when the surface does not react to it.
    fn gesture(&self, _gesture: &Gesture) -> bool {
        false
    }

    /// Current content as text lines.
    fn render(&self) -> Vec<String> {
        Vec::new()
    }

    /// Surfaces hosting other stacks (tab bars) expose the selected one.
    fn nested(&self) -> Option<Arc<NavigationStack>> {
        None
    }
}

/// Drive `surface`'s busy indicator and error notice from `state`.
///
/// The surface only ever sees a [`StateView`](crate::StateView) of the
/// container. The subscriptions live in the container's scope.
pub fn bind_surface(state: &StateContainer, surface: Arc<dyn Surface>) {
    let view = state.view();
    let mut busy = view.busy_signal();
    let target = Arc::clone(&surface);
    state.scope().spawn(async move {
        while let Some(busy) = busy.next().await {
            target.show_busy(busy);
        }
    });

    let mut errors = view.error_signal();
    state.scope().spawn(async move {
        while let Some(error) = errors.next().await {
            if let Some(error) = error {
                surface.show_error(&error);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Probe {
        busy: Mutex<Vec<bool>>,
        errors: Mutex<Vec<String>>,
    }

    impl Surface for Probe {
        fn title(&self) -> String {
            "probe".into()
        }

        fn show_busy(&self, busy: bool) {
            self.busy.lock().push(busy);
        }

        fn show_error(&self, error: &PresentationError) {
            self.errors.lock().push(error.to_string());
        }
    }

    #[tokio::test]
    async fn surface_follows_container_state() {
        let state = StateContainer::new("test");
        let probe = Arc::new(Probe::default());
        bind_surface(&state, probe.clone());

        tokio::time::sleep(Duration::from_millis(10)).await;
        state.busy().set(true);
        tokio::time::sleep(Duration::from_millis(10)).await;
        state.report(PresentationError::general("broken"));
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(*probe.busy.lock(), vec![false, true]);
        assert_eq!(*probe.errors.lock(), vec!["broken".to_string()]);
    }

    #[tokio::test]
    async fn unbound_after_teardown() {
        let state = StateContainer::new("test");
        let probe = Arc::new(Probe::default());
        bind_surface(&state, probe.clone());
        tokio::time::sleep(Duration::from_millis(10)).await;

        state.teardown();
        state.report(PresentationError::general("late"));
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(probe.errors.lock().is_empty());
    }
}
