//! The root coordinator.
//!
//! Owns the tab bar. Logging out dismantles the whole tree below the root,
//! one node at a time, and starts a fresh tab bar.

use std::sync::Arc;

use armature::{Coordinator, NavNode, NavigationStack, Registry};
use tracing::info;

use crate::scenes::LogoutCallback;
use crate::tab_bar::TabBarCoordinator;

pub struct AppCoordinator {
    node: NavNode,
    registry: Arc<Registry>,
}

impl AppCoordinator {
    /// `root` is the stack the host makes visible before calling `start`.
    pub fn new(root: Arc<NavigationStack>, registry: Arc<Registry>) -> Arc<Self> {
        Arc::new(Self {
            node: NavNode::new("app", root),
            registry,
        })
    }

    fn show_tab_bar(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let on_logout: LogoutCallback = Arc::new(move || {
            if let Some(this) = weak.upgrade() {
                this.logout();
            }
        });
        let tab_bar = TabBarCoordinator::new(
            Arc::clone(self.node.stack()),
            Arc::clone(&self.registry),
            on_logout,
        );
        self.node.start_child(tab_bar);
    }

    pub fn logout(self: &Arc<Self>) {
        info!("app: logging out");
        self.node.remove_descendants();
        self.show_tab_bar();
    }
}

impl Coordinator for AppCoordinator {
    fn node(&self) -> &NavNode {
        &self.node
    }

    fn start(self: Arc<Self>) {
        self.node.did_start();
        self.show_tab_bar();
    }
}
