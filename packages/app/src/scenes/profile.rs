//! Profile: the signed-in user's details, loaded after a simulated delay,
//! with an edit action that opens an edit screen.

use std::sync::Arc;
use std::time::Duration;

use armature::{
    bind_surface, for_each_latest, Container, Coordinator, EventSink, Events, Gesture, NavNode,
    NavigationStack, PresentationError, Registry, Signal, StateContainer, StreamTrackExt, Surface,
    Transform, ValueSlot,
};
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::console::Chrome;
use crate::services::Services;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileData {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl ProfileData {
    /// Shown until the first load completes.
    pub fn placeholder() -> Self {
        Self {
            name: "John Doe".into(),
            email: "john.doe@example.com".into(),
            avatar: Some("person.circle.fill".into()),
        }
    }
}

// ---------------------------------------------------------------------------
// ProfileContainer
// ---------------------------------------------------------------------------

pub struct ProfileInput {
    pub load: Events<()>,
    pub edit_profile: Events<()>,
}

pub struct ProfileOutput {
    pub profile: Signal<ProfileData>,
    pub edit_requested: Signal<()>,
}

pub struct ProfileContainer {
    state: StateContainer,
    profile: ValueSlot<ProfileData>,
    edit: EventSink<()>,
    delay: Duration,
}

impl ProfileContainer {
    pub fn new(delay: Duration) -> Arc<Self> {
        let state = StateContainer::new("profile");
        let profile = ValueSlot::gated(ProfileData::placeholder(), state.scope().token());
        let edit = EventSink::gated(state.scope().token());
        Arc::new(Self {
            state,
            profile,
            edit,
            delay,
        })
    }

    pub fn profile(&self) -> ProfileData {
        self.profile.get()
    }
}

impl Container for ProfileContainer {
    fn state(&self) -> &StateContainer {
        &self.state
    }
}

impl Transform for ProfileContainer {
    type Input = ProfileInput;
    type Output = ProfileOutput;

    fn transform(self: Arc<Self>, input: ProfileInput) -> ProfileOutput {
        let output = ProfileOutput {
            profile: self.profile.signal(),
            edit_requested: self.edit.subscribe(),
        };
        if !self.state.begin_transform() {
            return output;
        }

        let busy = self.state.busy().clone();
        let errors = self.state.last_error().clone();
        let delay = self.delay;
        let profile = self.profile.clone();
        self.state.scope().spawn(for_each_latest(
            input.load,
            move |()| {
                info!("profile: fetching profile data");
                stream::once(async move {
                    tokio::time::sleep(delay).await;
                    Ok::<_, PresentationError>(ProfileData::placeholder())
                })
                .track_and_route(busy.clone(), errors.clone())
                .boxed()
            },
            move |data| {
                info!("profile: profile data fetched");
                profile.set(data);
            },
        ));

        let edit = self.edit.clone();
        self.state
            .scope()
            .spawn(input.edit_profile.for_each(move |()| {
                info!("profile: edit profile requested");
                edit.send(());
                async {}
            }));

        output
    }
}

// ---------------------------------------------------------------------------
// Surfaces
// ---------------------------------------------------------------------------

pub struct ProfileScreen {
    chrome: Chrome,
    profile: Mutex<Option<ProfileData>>,
    load: EventSink<()>,
    edit: EventSink<()>,
}

impl ProfileScreen {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            chrome: Chrome::new(),
            profile: Mutex::new(None),
            load: EventSink::new(),
            edit: EventSink::new(),
        })
    }

    pub fn input(&self) -> ProfileInput {
        ProfileInput {
            load: self.load.subscribe(),
            edit_profile: self.edit.subscribe(),
        }
    }

    pub fn did_load(&self) {
        self.load.send(());
    }

    pub fn show_profile(&self, profile: ProfileData) {
        *self.profile.lock() = Some(profile);
    }

    pub fn profile(&self) -> Option<ProfileData> {
        self.profile.lock().clone()
    }
}

impl Surface for ProfileScreen {
    fn title(&self) -> String {
        "Profile".into()
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
                self.load.send(());
                true
            }
            Gesture::Action(name) if name == "edit" => {
                self.edit.send(());
                true
            }
            Gesture::Back => self.chrome.dismiss(),
            _ => false,
        }
    }

    fn render(&self) -> Vec<String> {
        let mut lines = self.chrome.header(&self.title());
        if let Some(profile) = self.profile.lock().as_ref() {
            lines.push(format!("name:  {}", profile.name));
            lines.push(format!("email: {}", profile.email));
        }
        lines.push("actions: edit".into());
        lines
    }
}

/// Read-only form for the profile being edited.
pub struct EditProfileScreen {
    profile: ProfileData,
}

impl Surface for EditProfileScreen {
    fn title(&self) -> String {
        "Edit Profile".into()
    }

    fn show_busy(&self, _busy: bool) {}

    fn show_error(&self, _error: &PresentationError) {}

    fn render(&self) -> Vec<String> {
        vec![
            format!("== {} ==", self.title()),
            format!("name:  [{}]", self.profile.name),
            format!("email: [{}]", self.profile.email),
        ]
    }
}

// ---------------------------------------------------------------------------
// ProfileCoordinator
// ---------------------------------------------------------------------------

pub struct ProfileCoordinator {
    node: NavNode,
    registry: Arc<Registry>,
}

impl ProfileCoordinator {
    pub fn new(stack: Arc<NavigationStack>, registry: Arc<Registry>) -> Arc<Self> {
        Arc::new(Self {
            node: NavNode::new("profile", stack),
            registry,
        })
    }

    fn show_profile(self: &Arc<Self>) {
        let services = Services::resolve(&self.registry);
        let container = ProfileContainer::new(services.config.simulated_delay);
        let screen = ProfileScreen::new();

        bind_surface(container.state(), screen.clone());
        let output = Arc::clone(&container).transform(screen.input());

        let target = Arc::clone(&screen);
        container
            .state()
            .scope()
            .spawn(output.profile.for_each(move |profile| {
                target.show_profile(profile);
                async {}
            }));

        let weak = Arc::downgrade(self);
        let snapshot = Arc::downgrade(&container);
        container
            .state()
            .scope()
            .spawn(output.edit_requested.for_each(move |()| {
                if let (Some(this), Some(container)) = (weak.upgrade(), snapshot.upgrade()) {
                    this.show_edit_profile(container.profile());
                }
                async {}
            }));

        self.node.own(container);
        self.node.stack().push(screen.clone());
        screen.did_load();
    }

    fn show_edit_profile(&self, profile: ProfileData) {
        info!("profile: showing edit profile for {}", profile.name);
        self.node.stack().push(Arc::new(EditProfileScreen { profile }));
    }
}

impl Coordinator for ProfileCoordinator {
    fn node(&self) -> &NavNode {
        &self.node
    }

    fn start(self: Arc<Self>) {
        self.node.did_start();
        self.show_profile();
    }
}
