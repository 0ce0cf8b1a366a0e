//! Home: a list of items fetched from `GET /{version}/items`, with a detail
//! screen pushed on selection.
//!
//! ```text
//! HomeCoordinator ──owns──► HomeContainer ◄──inputs── HomeScreen
//!        │                        │
//!        │ selected_item ◄────────┘
//!        └──start_child──► DetailCoordinator ──push──► DetailScreen
//! ```

use std::sync::{Arc, Weak};

use armature::{
    bind_surface, for_each_latest, Container, Coordinator, EventSink, Events, Gesture, NavNode,
    NavigationStack, NodeId, NodeState, PresentationError, Registry, Signal, StateContainer,
    StreamTrackExt, Surface, Transform, ValueSlot,
};
use armature_net::{Endpoint, NetworkService};
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::console::Chrome;
use crate::services::Services;

// ---------------------------------------------------------------------------
// HomeItem
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeItem {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Symbol name of the item's icon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl HomeItem {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            title: title.into(),
            description: description.into(),
            icon: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn created_days_ago(mut self, days: i64) -> Self {
        self.created_at = Utc::now() - chrono::Duration::days(days);
        self
    }

    /// The catalogue served in offline mode and by the test API.
    pub fn samples() -> Vec<HomeItem> {
        vec![
            HomeItem::new(
                "Getting Started",
                "Learn how state containers, navigation nodes and the request pipeline fit together",
            )
            .with_icon("star.fill")
            .created_days_ago(2),
            HomeItem::new("Networking", "Turn endpoints into typed results with the request pipeline")
                .with_icon("network")
                .created_days_ago(1),
            HomeItem::new("UI Components", "Build surfaces that show busy and error state uniformly")
                .with_icon("rectangle.3.group.fill"),
            HomeItem::new("Testing", "Write tests for your containers and coordinators")
                .with_icon("checkmark.seal.fill")
                .created_days_ago(3),
            HomeItem::new(
                "Advanced Patterns",
                "Explore dependency registries and switch-latest request handling",
            )
            .with_icon("gear.circle.fill")
            .created_days_ago(4),
        ]
    }
}

// ---------------------------------------------------------------------------
// HomeContainer
// ---------------------------------------------------------------------------

pub struct HomeInput {
    pub load: Events<()>,
    pub refresh: Events<()>,
    pub item_selected: Events<HomeItem>,
}

pub struct HomeOutput {
    /// Current list, replayed to late subscribers.
    pub items: Signal<Vec<HomeItem>>,
    pub selected_item: Signal<HomeItem>,
}

pub struct HomeContainer {
    state: StateContainer,
    network: NetworkService,
    endpoint: Endpoint,
    items: ValueSlot<Vec<HomeItem>>,
    selected: EventSink<HomeItem>,
}

impl HomeContainer {
    pub fn new(network: NetworkService, endpoint: Endpoint) -> Arc<Self> {
        let state = StateContainer::new("home");
        let items = ValueSlot::gated(Vec::new(), state.scope().token());
        let selected = EventSink::gated(state.scope().token());
        Arc::new(Self {
            state,
            network,
            endpoint,
            items,
            selected,
        })
    }

    pub fn items(&self) -> Vec<HomeItem> {
        self.items.get()
    }

    /// Every later write to the item list, without replay.
    pub fn item_changes(&self) -> Signal<Vec<HomeItem>> {
        self.items.changes()
    }

    fn fetch_items(&self) -> BoxStream<'static, Vec<HomeItem>> {
        info!("home: fetching items");
        self.network
            .load::<Vec<HomeItem>>(&self.endpoint)
            .track_and_route(self.state.busy().clone(), self.state.last_error().clone())
            .boxed()
    }
}

impl Container for HomeContainer {
    fn state(&self) -> &StateContainer {
        &self.state
    }
}

impl Transform for HomeContainer {
    type Input = HomeInput;
    type Output = HomeOutput;

    fn transform(self: Arc<Self>, input: HomeInput) -> HomeOutput {
        let output = HomeOutput {
            items: self.items.signal(),
            selected_item: self.selected.subscribe(),
        };
        if !self.state.begin_transform() {
            return output;
        }

        // Load and refresh share one switch-latest driver: a refresh while a
        // fetch is in flight drops the older fetch.
        let triggers = stream::select(input.load, input.refresh).boxed();
        let weak = Arc::downgrade(&self);
        let items = self.items.clone();
        self.state.scope().spawn(for_each_latest(
            triggers,
            move |()| match weak.upgrade() {
                Some(this) => this.fetch_items(),
                None => stream::empty().boxed(),
            },
            move |fetched: Vec<HomeItem>| {
                info!("home: fetched {} items", fetched.len());
                items.set(fetched);
            },
        ));

        let selected = self.selected.clone();
        self.state
            .scope()
            .spawn(input.item_selected.for_each(move |item| {
                info!("home: item selected: {}", item.title);
                selected.send(item);
                async {}
            }));

        output
    }
}

// ---------------------------------------------------------------------------
// Surfaces
// ---------------------------------------------------------------------------

pub struct HomeScreen {
    chrome: Chrome,
    items: Mutex<Vec<HomeItem>>,
    load: EventSink<()>,
    refresh: EventSink<()>,
    selected: EventSink<HomeItem>,
}

impl HomeScreen {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            chrome: Chrome::new(),
            items: Mutex::new(Vec::new()),
            load: EventSink::new(),
            refresh: EventSink::new(),
            selected: EventSink::new(),
        })
    }

    /// Input bundle wired to this screen's gestures.
    pub fn input(&self) -> HomeInput {
        HomeInput {
            load: self.load.subscribe(),
            refresh: self.refresh.subscribe(),
            item_selected: self.selected.subscribe(),
        }
    }

    pub fn did_load(&self) {
        self.load.send(());
    }

    pub fn show_items(&self, items: Vec<HomeItem>) {
        *self.items.lock() = items;
    }

    pub fn items(&self) -> Vec<HomeItem> {
        self.items.lock().clone()
    }

    pub fn chrome(&self) -> &Chrome {
        &self.chrome
    }
}

impl Surface for HomeScreen {
    fn title(&self) -> String {
        "Home".into()
    }

    fn show_busy(&self, busy: bool) {
        self.chrome.set_busy(busy);
    }

    fn show_error(&self, error: &PresentationError) {
        self.chrome.set_error(error);
    }

    fn gesture(&self, gesture: &Gesture) -> bool {
        match gesture {
            Gesture::Refresh => {
                self.refresh.send(());
                true
            }
            Gesture::Select(index) => match self.items.lock().get(*index) {
                Some(item) => {
                    self.selected.send(item.clone());
                    true
                }
                None => false,
            },
            Gesture::Back => self.chrome.dismiss(),
            _ => false,
        }
    }

    fn render(&self) -> Vec<String> {
        let mut lines = self.chrome.header(&self.title());
        let items = self.items.lock();
        if items.is_empty() && !self.chrome.is_busy() {
            lines.push("(no items)".into());
        }
        for (index, item) in items.iter().enumerate() {
            lines.push(format!("[{index}] {}: {}", item.title, item.description));
        }
        lines
    }
}

pub struct DetailScreen {
    item: HomeItem,
    on_back: Box<dyn Fn() + Send + Sync>,
}

impl DetailScreen {
    pub fn new(item: HomeItem, on_back: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            item,
            on_back: Box::new(on_back),
        }
    }

    pub fn item(&self) -> &HomeItem {
        &self.item
    }
}

impl Surface for DetailScreen {
    fn title(&self) -> String {
        self.item.title.clone()
    }

    fn show_busy(&self, _busy: bool) {}

    fn show_error(&self, _error: &PresentationError) {}

    fn gesture(&self, gesture: &Gesture) -> bool {
        if *gesture == Gesture::Back {
            (self.on_back)();
            return true;
        }
        false
    }

    fn render(&self) -> Vec<String> {
        let mut lines = vec![format!("== {} ==", self.item.title), self.item.description.clone()];
        if let Some(icon) = &self.item.icon {
            lines.push(format!("icon: {icon}"));
        }
        lines.push(format!("created: {}", self.item.created_at.format("%Y-%m-%d")));
        lines
    }
}

// ---------------------------------------------------------------------------
// Coordinators
// ---------------------------------------------------------------------------

pub struct HomeCoordinator {
    node: NavNode,
    registry: Arc<Registry>,
    screen: Mutex<Option<Arc<dyn Surface>>>,
}

impl HomeCoordinator {
    pub fn new(stack: Arc<NavigationStack>, registry: Arc<Registry>) -> Arc<Self> {
        Arc::new(Self {
            node: NavNode::new("home", stack),
            registry,
            screen: Mutex::new(None),
        })
    }

    fn show_home(self: &Arc<Self>) {
        let services = Services::resolve(&self.registry);
        let container = HomeContainer::new(services.network, services.config.endpoint("items"));
        let screen = HomeScreen::new();

        bind_surface(container.state(), screen.clone());
        let output = Arc::clone(&container).transform(screen.input());

        let target = Arc::clone(&screen);
        container
            .state()
            .scope()
            .spawn(output.items.for_each(move |items| {
                target.show_items(items);
                async {}
            }));

        let weak = Arc::downgrade(self);
        container
            .state()
            .scope()
            .spawn(output.selected_item.for_each(move |item| {
                if let Some(this) = weak.upgrade() {
                    this.show_detail(item);
                }
                async {}
            }));

        self.node.own(container);
        *self.screen.lock() = Some(screen.clone() as Arc<dyn Surface>);
        self.node.stack().push(screen.clone());
        screen.did_load();
    }

    /// Push a detail for `item` unless one is already showing.
    fn show_detail(self: &Arc<Self>, item: HomeItem) {
        let showing = self
            .node
            .children()
            .iter()
            .any(|child| child.node().state() == NodeState::Started);
        if showing {
            debug!("home: detail already showing; ignoring {}", item.title);
            return;
        }

        let weak = Arc::downgrade(self);
        let on_close = move |id: NodeId| {
            if let Some(this) = weak.upgrade() {
                this.close_detail(id);
            }
        };
        let detail = DetailCoordinator::new(Arc::clone(self.node.stack()), item, on_close);
        if self.node.start_child(detail) {
            info!("home: navigated to detail");
        }
    }

    /// Release the detail node `id` and return to the list.
    pub fn close_detail(&self, id: NodeId) {
        let Some(child) = self.node.children().into_iter().find(|c| c.node().id() == id) else {
            debug!("home: no detail {id} to close");
            return;
        };
        self.node.remove_child(child.as_ref());
        if let Some(screen) = self.screen.lock().as_ref() {
            self.node.stack().pop_to(screen);
        }
    }
}

impl Coordinator for HomeCoordinator {
    fn node(&self) -> &NavNode {
        &self.node
    }

    fn start(self: Arc<Self>) {
        self.node.did_start();
        self.show_home();
    }
}

/// Shows one item. Shares its parent's display stack.
pub struct DetailCoordinator {
    node: NavNode,
    item: HomeItem,
    on_close: Box<dyn Fn(NodeId) + Send + Sync>,
}

impl DetailCoordinator {
    pub fn new(
        stack: Arc<NavigationStack>,
        item: HomeItem,
        on_close: impl Fn(NodeId) + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            node: NavNode::new("detail", stack),
            item,
            on_close: Box::new(on_close),
        })
    }

    pub fn item(&self) -> &HomeItem {
        &self.item
    }
}

impl Coordinator for DetailCoordinator {
    fn node(&self) -> &NavNode {
        &self.node
    }

    fn start(self: Arc<Self>) {
        self.node.did_start();
        let weak: Weak<Self> = Arc::downgrade(&self);
        let screen = DetailScreen::new(self.item.clone(), move || {
            if let Some(this) = weak.upgrade() {
                (this.on_close)(this.node.id());
            }
        });
        self.node.stack().push(Arc::new(screen));
        info!("home: showing detail for {}", self.item.title);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use armature_net::{BoxError, RawResponse, RequestDescriptor, Transport};
    use async_trait::async_trait;

    struct Reply(u16, String);

    #[async_trait]
    impl Transport for Reply {
        async fn send(&self, _request: RequestDescriptor) -> Result<RawResponse, BoxError> {
            Ok(RawResponse::new(self.0, self.1.clone()))
        }
    }

    fn container(status: u16, body: String) -> Arc<HomeContainer> {
        HomeContainer::new(
            NetworkService::new(Arc::new(Reply(status, body))),
            Endpoint::get("https://api.example.com", "v1/items"),
        )
    }

    fn inputs() -> (EventSink<()>, EventSink<()>, EventSink<HomeItem>, HomeInput) {
        let load = EventSink::new();
        let refresh = EventSink::new();
        let selected = EventSink::new();
        let input = HomeInput {
            load: load.subscribe(),
            refresh: refresh.subscribe(),
            item_selected: selected.subscribe(),
        };
        (load, refresh, selected, input)
    }

    #[tokio::test]
    async fn load_fills_items_and_settles_busy() {
        let body = serde_json::to_string(&HomeItem::samples()).unwrap();
        let home = container(200, body);
        let (load, _refresh, _selected, input) = inputs();
        let mut busy = home.state().busy().changes();
        let _output = Arc::clone(&home).transform(input);

        load.send(());
        assert_eq!(busy.next().await, Some(true));
        assert_eq!(busy.next().await, Some(false));
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(home.items().len(), 5);
        assert!(home.state().last_error().get().is_none());
    }

    #[tokio::test]
    async fn http_failure_lands_in_last_error() {
        let home = container(500, "server error".into());
        let (load, _refresh, _selected, input) = inputs();
        let mut errors = home.state().last_error().changes();
        let _output = Arc::clone(&home).transform(input);

        load.send(());
        let error = errors.next().await.flatten().expect("error reported");
        assert!(error.to_string().contains("500"));
        assert!(home.items().is_empty());
        assert!(!home.state().busy().get());
    }

    #[tokio::test]
    async fn selection_is_forwarded() {
        let home = container(200, "[]".into());
        let (_load, _refresh, selected, input) = inputs();
        let mut output = Arc::clone(&home).transform(input);

        let item = HomeItem::new("One", "first");
        selected.send(item.clone());
        assert_eq!(output.selected_item.next().await, Some(item));
    }

    #[tokio::test]
    async fn second_transform_subscribes_nothing() {
        let home = container(200, "[]".into());
        let (_l1, _r1, _s1, first) = inputs();
        let _ = Arc::clone(&home).transform(first);
        let active = home.state().scope().active();

        let (load, _r2, _s2, second) = inputs();
        let _ = Arc::clone(&home).transform(second);
        assert_eq!(home.state().scope().active(), active);
        // The rejected input bundle was dropped, not subscribed.
        assert_eq!(load.subscriber_count(), 0);
    }

    #[test]
    fn screen_ignores_out_of_range_selection() {
        let screen = HomeScreen::new();
        screen.show_items(HomeItem::samples());
        assert!(screen.gesture(&Gesture::Select(4)));
        assert!(!screen.gesture(&Gesture::Select(5)));
    }

    #[test]
    fn samples_carry_icons_and_ages() {
        let samples = HomeItem::samples();
        assert_eq!(samples.len(), 5);
        assert!(samples.iter().all(|item| item.icon.is_some()));
        assert!(samples[3].created_at < samples[0].created_at);
    }
}
