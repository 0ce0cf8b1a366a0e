//! The tab bar: one display stack and one child coordinator per tab.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use armature::{
    Coordinator, Gesture, NavNode, NavigationStack, PresentationError, Registry, Surface,
};
use tracing::{debug, info};

use crate::scenes::{HomeCoordinator, LogoutCallback, ProfileCoordinator, SettingsCoordinator};

pub const TABS: [&str; 3] = ["Home", "Profile", "Settings"];

/// Hosts the tab stacks and shows the selected one.
pub struct TabBarSurface {
    tabs: Vec<(&'static str, Arc<NavigationStack>)>,
    selected: AtomicUsize,
}

impl TabBarSurface {
    pub fn new(tabs: Vec<(&'static str, Arc<NavigationStack>)>) -> Self {
        Self {
            tabs,
            selected: AtomicUsize::new(0),
        }
    }

    /// Select a tab by title, ignoring case.
    pub fn select(&self, title: &str) -> bool {
        match self.tabs.iter().position(|(t, _)| t.eq_ignore_ascii_case(title)) {
            Some(index) => {
                self.selected.store(index, Ordering::SeqCst);
                debug!("tabs: selected {}", self.tabs[index].0);
                true
            }
            None => false,
        }
    }

    pub fn selected_title(&self) -> &'static str {
        self.tabs
            .get(self.selected.load(Ordering::SeqCst))
            .map(|(title, _)| *title)
            .unwrap_or_default()
    }

    pub fn stack(&self, title: &str) -> Option<Arc<NavigationStack>> {
        self.tabs
            .iter()
            .find(|(t, _)| t.eq_ignore_ascii_case(title))
            .map(|(_, stack)| Arc::clone(stack))
    }
}

impl Surface for TabBarSurface {
    fn title(&self) -> String {
        "Tabs".into()
    }

    fn show_busy(&self, _busy: bool) {}

    fn show_error(&self, _error: &PresentationError) {}

    fn gesture(&self, gesture: &Gesture) -> bool {
        match gesture {
            Gesture::Tab(title) => self.select(title),
            _ => false,
        }
    }

    fn render(&self) -> Vec<String> {
        let selected = self.selected_title();
        let titles: Vec<String> = self
            .tabs
            .iter()
            .map(|(title, _)| {
                if *title == selected {
                    format!("[{title}]")
                } else {
                    title.to_string()
                }
            })
            .collect();
        vec![format!("tabs: {}", titles.join(" | "))]
    }

    fn nested(&self) -> Option<Arc<NavigationStack>> {
        self.tabs
            .get(self.selected.load(Ordering::SeqCst))
            .map(|(_, stack)| Arc::clone(stack))
    }
}

pub struct TabBarCoordinator {
    node: NavNode,
    registry: Arc<Registry>,
    on_logout: LogoutCallback,
}

impl TabBarCoordinator {
    pub fn new(
        stack: Arc<NavigationStack>,
        registry: Arc<Registry>,
        on_logout: LogoutCallback,
    ) -> Arc<Self> {
        Arc::new(Self {
            node: NavNode::new("tab_bar", stack),
            registry,
            on_logout,
        })
    }

    fn setup_tabs(&self) -> Vec<(&'static str, Arc<NavigationStack>)> {
        let home = Arc::new(NavigationStack::new());
        let profile = Arc::new(NavigationStack::new());
        let settings = Arc::new(NavigationStack::new());

        self.node
            .start_child(HomeCoordinator::new(Arc::clone(&home), Arc::clone(&self.registry)));
        self.node
            .start_child(ProfileCoordinator::new(Arc::clone(&profile), Arc::clone(&self.registry)));
        self.node.start_child(SettingsCoordinator::new(
            Arc::clone(&settings),
            Arc::clone(&self.registry),
            Arc::clone(&self.on_logout),
        ));

        vec![(TABS[0], home), (TABS[1], profile), (TABS[2], settings)]
    }
}

impl Coordinator for TabBarCoordinator {
    fn node(&self) -> &NavNode {
        &self.node
    }

    fn start(self: Arc<Self>) {
        self.node.did_start();
        let tabs = self.setup_tabs();
        info!("tabs: {} tabs ready", tabs.len());
        let surface: Arc<dyn Surface> = Arc::new(TabBarSurface::new(tabs));
        self.node.stack().replace_all(vec![surface]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_is_case_insensitive_and_drives_nested() {
        let home = Arc::new(NavigationStack::new());
        let settings = Arc::new(NavigationStack::new());
        let bar = TabBarSurface::new(vec![("Home", home.clone()), ("Settings", settings.clone())]);

        assert_eq!(bar.selected_title(), "Home");
        assert!(bar.gesture(&Gesture::Tab("settings".into())));
        assert!(Arc::ptr_eq(&bar.nested().unwrap(), &settings));
        assert!(!bar.select("missing"));
        assert_eq!(bar.render(), vec!["tabs: Home | [Settings]"]);
    }
}
