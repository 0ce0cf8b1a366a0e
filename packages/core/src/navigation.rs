//! Navigation ownership tree.
//!
//! A [`Coordinator`] owns a display stack ([`NavigationStack`]) and the child
//! coordinators it started. Ownership is strictly single-parent: a node is in
//! at most one child list and never inside its own subtree.
//!
//! # Node states
//!
//! ```text
//! Uninitialized ──start()──► Started ──removed by parent──► Detached
//! ```
//!
//! Detaching a node tears down the state containers it owns. Its own
//! children are left alone; each must be detached explicitly by identity.
//!
//! Navigation intents travel as plain callbacks handed downward at
//! construction time. Children never hold a strong reference to a parent.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::container::Container;
use crate::surface::Surface;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a navigation node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Uninitialized,
    Started,
    Detached,
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeState::Uninitialized => write!(f, "uninitialized"),
            NodeState::Started => write!(f, "started"),
            NodeState::Detached => write!(f, "detached"),
        }
    }
}

// ---------------------------------------------------------------------------
// NavigationStack
// ---------------------------------------------------------------------------

/// An ordered stack of surfaces; the last one is visible.
pub struct NavigationStack {
    screens: Mutex<Vec<Arc<dyn Surface>>>,
}

impl Default for NavigationStack {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationStack {
    pub fn new() -> Self {
        Self {
            screens: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, screen: Arc<dyn Surface>) {
        debug!("navigation: push {}", screen.title());
        self.screens.lock().push(screen);
    }

    pub fn pop(&self) -> Option<Arc<dyn Surface>> {
        let popped = self.screens.lock().pop();
        if let Some(screen) = &popped {
            debug!("navigation: pop {}", screen.title());
        }
        popped
    }

    /// Pop until `screen` is on top. Returns `false` if it is not on the stack.
    pub fn pop_to(&self, screen: &Arc<dyn Surface>) -> bool {
        let mut screens = self.screens.lock();
        match screens.iter().rposition(|s| Arc::ptr_eq(s, screen)) {
            Some(index) => {
                screens.truncate(index + 1);
                true
            }
            None => false,
        }
    }

    /// Replace the whole stack with `screens`.
    pub fn replace_all(&self, screens: Vec<Arc<dyn Surface>>) {
        *self.screens.lock() = screens;
    }

    pub fn set_root(&self, screen: Arc<dyn Surface>) {
        self.replace_all(vec![screen]);
    }

    pub fn top(&self) -> Option<Arc<dyn Surface>> {
        self.screens.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.screens.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.lock().is_empty()
    }

    pub fn titles(&self) -> Vec<String> {
        self.screens.lock().iter().map(|s| s.title()).collect()
    }

    /// The innermost visible stack, following nested tab bars.
    pub fn visible(self: &Arc<Self>) -> Arc<NavigationStack> {
        let mut current = Arc::clone(self);
        while let Some(nested) = current.top().and_then(|top| top.nested()) {
            current = nested;
        }
        current
    }
}

// ---------------------------------------------------------------------------
// NavNode
// ---------------------------------------------------------------------------

/// State every coordinator carries: identity, display stack, children and
/// the containers it created.
pub struct NavNode {
    id: NodeId,
    name: &'static str,
    stack: Arc<NavigationStack>,
    children: Mutex<Vec<Arc<dyn Coordinator>>>,
    containers: Mutex<Vec<Arc<dyn Container>>>,
    state: Mutex<NodeState>,
    attached: AtomicBool,
}

impl NavNode {
    pub fn new(name: &'static str, stack: Arc<NavigationStack>) -> Self {
        Self {
            id: NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)),
            name,
            stack,
            children: Mutex::new(Vec::new()),
            containers: Mutex::new(Vec::new()),
            state: Mutex::new(NodeState::Uninitialized),
            attached: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn stack(&self) -> &Arc<NavigationStack> {
        &self.stack
    }

    pub fn state(&self) -> NodeState {
        *self.state.lock()
    }

    /// Whether this node currently sits in some parent's child list.
    pub fn has_parent(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    /// Record that `start` ran. Every concrete `start` calls this first.
    pub fn did_start(&self) {
        let mut state = self.state.lock();
        if *state == NodeState::Started {
            warn!("navigation: {} started twice", self.name);
        }
        *state = NodeState::Started;
        info!("navigation: starting {}", self.name);
    }

    /// Take ownership of `child`.
    ///
    /// Refused (with a warning) when `child` already has a parent or when
    /// this node lies inside `child`'s subtree.
    pub fn add_child(&self, child: Arc<dyn Coordinator>) -> bool {
        let node = child.node();
        if node.contains(self.id) {
            warn!(
                "navigation: refusing to add {} under {}: would create a cycle",
                node.name, self.name
            );
            return false;
        }
        if node.attached.swap(true, Ordering::SeqCst) {
            warn!(
                "navigation: refusing to add {} under {}: already owned",
                node.name, self.name
            );
            return false;
        }
        debug!("navigation: {} owns {}", self.name, node.name);
        self.children.lock().push(child);
        true
    }

    /// Give up ownership of the child with `child`'s identity and detach it.
    ///
    /// Removing a node that is not a child is a no-op.
    pub fn remove_child(&self, child: &dyn Coordinator) -> Option<Arc<dyn Coordinator>> {
        let id = child.node().id;
        let removed = {
            let mut children = self.children.lock();
            children
                .iter()
                .position(|c| c.node().id == id)
                .map(|index| children.remove(index))
        };

        match &removed {
            Some(child) => {
                child.node().detach();
                debug!("navigation: {} released {}", self.name, child.node().name);
            }
            None => debug!("navigation: {} has no child {id}; nothing removed", self.name),
        }
        removed
    }

    /// Add `child` and start it.
    pub fn start_child(&self, child: Arc<dyn Coordinator>) -> bool {
        if !self.add_child(Arc::clone(&child)) {
            return false;
        }
        child.start();
        true
    }

    /// Detach every descendant, deepest first, one identity at a time.
    pub fn remove_descendants(&self) {
        for child in self.children() {
            child.node().remove_descendants();
            self.remove_child(child.as_ref());
        }
    }

    pub fn children(&self) -> Vec<Arc<dyn Coordinator>> {
        self.children.lock().clone()
    }

    pub fn child_count(&self) -> usize {
        self.children.lock().len()
    }

    /// Whether `id` is this node or any descendant.
    pub fn contains(&self, id: NodeId) -> bool {
        self.id == id || self.children.lock().iter().any(|c| c.node().contains(id))
    }

    /// Keep `container` alive for as long as this node is attached.
    pub fn own(&self, container: Arc<dyn Container>) {
        self.containers.lock().push(container);
    }

    pub fn container_count(&self) -> usize {
        self.containers.lock().len()
    }

    fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
        *self.state.lock() = NodeState::Detached;
        let containers = std::mem::take(&mut *self.containers.lock());
        for container in &containers {
            container.state().teardown();
        }
        info!(
            "navigation: {} detached ({} containers torn down, {} children kept)",
            self.name,
            containers.len(),
            self.child_count()
        );
    }

    /// Indented outline of this subtree.
    pub fn describe_tree(&self) -> String {
        let mut out = String::new();
        self.describe_into(&mut out, 0);
        out
    }

    fn describe_into(&self, out: &mut String, depth: usize) {
        let _ = writeln!(
            out,
            "{:indent$}{} {} [{}] screens={:?}",
            "",
            self.name,
            self.id,
            self.state(),
            self.stack.titles(),
            indent = depth * 2
        );
        for child in self.children() {
            child.node().describe_into(out, depth + 1);
        }
    }
}

impl Drop for NavNode {
    fn drop(&mut self) {
        debug!("navigation: {} deinitialised", self.name);
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// A navigation node.
///
/// `start` has no default: a node that does not say what it shows is a
/// programming error, caught at compile time.
pub trait Coordinator: Send + Sync + 'static {
    fn node(&self) -> &NavNode;

    /// Push the node's first surface and/or build and start its children.
    fn start(self: Arc<Self>);
}
