//! Settings: four sections of typed rows. Selecting a row resolves it to a
//! [`Setting`]; selecting Logout raises a logout intent.
//!
//! | Section | Rows |
//! |---------|------|
//! | 0 Account | Profile, Notifications, Logout |
//! | 1 Appearance | Theme, Text Size |
//! | 2 Privacy | Data Usage, App Permissions |
//! | 3 About | Version, Terms of Service, Privacy Policy |

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use armature::{
    bind_surface, for_each_latest, Container, Coordinator, EventSink, Events, Gesture, NavNode,
    NavigationStack, PresentationError, Registry, Signal, StateContainer, StreamTrackExt, Surface,
    Transform,
};
use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use crate::console::Chrome;
use crate::services::Services;

// ---------------------------------------------------------------------------
// Setting model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsSection {
    Account,
    Appearance,
    Privacy,
    About,
}

impl SettingsSection {
    pub const ALL: [SettingsSection; 4] = [
        SettingsSection::Account,
        SettingsSection::Appearance,
        SettingsSection::Privacy,
        SettingsSection::About,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn title(self) -> &'static str {
        match self {
            SettingsSection::Account => "Account",
            SettingsSection::Appearance => "Appearance",
            SettingsSection::Privacy => "Privacy",
            SettingsSection::About => "About",
        }
    }

    pub fn rows(self) -> Vec<Setting> {
        match self {
            SettingsSection::Account => AccountSetting::ALL.map(Setting::Account).to_vec(),
            SettingsSection::Appearance => AppearanceSetting::ALL.map(Setting::Appearance).to_vec(),
            SettingsSection::Privacy => PrivacySetting::ALL.map(Setting::Privacy).to_vec(),
            SettingsSection::About => AboutSetting::ALL.map(Setting::About).to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountSetting {
    Profile,
    Notifications,
    Logout,
}

impl AccountSetting {
    pub const ALL: [AccountSetting; 3] = [
        AccountSetting::Profile,
        AccountSetting::Notifications,
        AccountSetting::Logout,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppearanceSetting {
    Theme,
    TextSize,
}

impl AppearanceSetting {
    pub const ALL: [AppearanceSetting; 2] = [AppearanceSetting::Theme, AppearanceSetting::TextSize];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivacySetting {
    DataUsage,
    Permissions,
}

impl PrivacySetting {
    pub const ALL: [PrivacySetting; 2] = [PrivacySetting::DataUsage, PrivacySetting::Permissions];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AboutSetting {
    Version,
    Terms,
    PrivacyPolicy,
}

impl AboutSetting {
    pub const ALL: [AboutSetting; 3] = [
        AboutSetting::Version,
        AboutSetting::Terms,
        AboutSetting::PrivacyPolicy,
    ];
}

/// One row of the settings list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    Account(AccountSetting),
    Appearance(AppearanceSetting),
    Privacy(PrivacySetting),
    About(AboutSetting),
}

impl Setting {
    /// `None` when either index is out of range.
    pub fn from_index(section: usize, row: usize) -> Option<Self> {
        SettingsSection::from_index(section)?.rows().get(row).copied()
    }

    pub fn section(self) -> SettingsSection {
        match self {
            Setting::Account(_) => SettingsSection::Account,
            Setting::Appearance(_) => SettingsSection::Appearance,
            Setting::Privacy(_) => SettingsSection::Privacy,
            Setting::About(_) => SettingsSection::About,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Setting::Account(AccountSetting::Profile) => "Profile",
            Setting::Account(AccountSetting::Notifications) => "Notifications",
            Setting::Account(AccountSetting::Logout) => "Logout",
            Setting::Appearance(AppearanceSetting::Theme) => "Theme",
            Setting::Appearance(AppearanceSetting::TextSize) => "Text Size",
            Setting::Privacy(PrivacySetting::DataUsage) => "Data Usage",
            Setting::Privacy(PrivacySetting::Permissions) => "App Permissions",
            Setting::About(AboutSetting::Version) => "Version",
            Setting::About(AboutSetting::Terms) => "Terms of Service",
            Setting::About(AboutSetting::PrivacyPolicy) => "Privacy Policy",
        }
    }

    pub fn is_logout(self) -> bool {
        self == Setting::Account(AccountSetting::Logout)
    }
}

// ---------------------------------------------------------------------------
// SettingsContainer
// ---------------------------------------------------------------------------

pub struct SettingsInput {
    pub load: Events<()>,
    pub setting_selected: Events<(usize, usize)>,
}

pub struct SettingsOutput {
    pub settings_loaded: Signal<()>,
    pub setting: Signal<Setting>,
    pub logout: Signal<()>,
}

pub struct SettingsContainer {
    state: StateContainer,
    loaded: EventSink<()>,
    selected: EventSink<Setting>,
    logout: EventSink<()>,
    delay: Duration,
}

impl SettingsContainer {
    pub fn new(delay: Duration) -> Arc<Self> {
        let state = StateContainer::new("settings");
        let token = state.scope().token();
        Arc::new(Self {
            loaded: EventSink::gated(token.clone()),
            selected: EventSink::gated(token.clone()),
            logout: EventSink::gated(token),
            state,
            delay,
        })
    }
}

impl Container for SettingsContainer {
    fn state(&self) -> &StateContainer {
        &self.state
    }
}

impl Transform for SettingsContainer {
    type Input = SettingsInput;
    type Output = SettingsOutput;

    fn transform(self: Arc<Self>, input: SettingsInput) -> SettingsOutput {
        let output = SettingsOutput {
            settings_loaded: self.loaded.subscribe(),
            setting: self.selected.subscribe(),
            logout: self.logout.subscribe(),
        };
        if !self.state.begin_transform() {
            return output;
        }

        let busy = self.state.busy().clone();
        let errors = self.state.last_error().clone();
        let delay = self.delay;
        let loaded = self.loaded.clone();
        self.state.scope().spawn(for_each_latest(
            input.load,
            move |()| {
                info!("settings: loading settings");
                stream::once(async move {
                    tokio::time::sleep(delay).await;
                    Ok::<_, PresentationError>(())
                })
                .track_and_route(busy.clone(), errors.clone())
                .boxed()
            },
            move |()| {
                info!("settings: settings loaded");
                loaded.send(());
            },
        ));

        let selected = self.selected.clone();
        let logout = self.logout.clone();
        self.state
            .scope()
            .spawn(input.setting_selected.for_each(move |(section, row)| {
                match Setting::from_index(section, row) {
                    Some(setting) => {
                        info!(
                            "settings: {} setting selected: {}",
                            setting.section().title(),
                            setting.title()
                        );
                        selected.send(setting);
                        if setting.is_logout() {
                            info!("settings: logout requested");
                            logout.send(());
                        }
                    }
                    None => debug!("settings: ignoring selection {section}/{row}"),
                }
                async {}
            }));

        output
    }
}

// ---------------------------------------------------------------------------
// SettingsScreen
// ---------------------------------------------------------------------------

pub struct SettingsScreen {
    chrome: Chrome,
    loaded: AtomicBool,
    version: &'static str,
    load: EventSink<()>,
    selected: EventSink<(usize, usize)>,
}

impl SettingsScreen {
    pub fn new(version: &'static str) -> Arc<Self> {
        Arc::new(Self {
            chrome: Chrome::new(),
            loaded: AtomicBool::new(false),
            version,
            load: EventSink::new(),
            selected: EventSink::new(),
        })
    }

    pub fn input(&self) -> SettingsInput {
        SettingsInput {
            load: self.load.subscribe(),
            setting_selected: self.selected.subscribe(),
        }
    }

    pub fn did_load(&self) {
        self.load.send(());
    }

    pub fn show_loaded(&self) {
        self.loaded.store(true, Ordering::SeqCst);
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }
}

impl Surface for SettingsScreen {
    fn title(&self) -> String {
        "Settings".into()
    }

    fn show_busy(&self, busy: bool) {
        self.chrome.set_busy(busy);
    }

    fn show_error(&self, error: &PresentationError) {
        self.chrome.set_error(error);
    }

    fn gesture(&self, gesture: &Gesture) -> bool {
        match gesture {
            Gesture::SelectRow { section, row } => {
                self.selected.send((*section, *row));
                true
            }
            Gesture::Back => self.chrome.dismiss(),
            _ => false,
        }
    }

    fn render(&self) -> Vec<String> {
        let mut lines = self.chrome.header(&self.title());
        if !self.is_loaded() {
            return lines;
        }
        for (s, section) in SettingsSection::ALL.iter().enumerate() {
            lines.push(section.title().to_string());
            for (r, setting) in section.rows().iter().enumerate() {
                match setting {
                    Setting::About(AboutSetting::Version) => {
                        lines.push(format!("  [{s} {r}] {} {}", setting.title(), self.version))
                    }
                    _ => lines.push(format!("  [{s} {r}] {}", setting.title())),
                }
            }
        }
        lines
    }
}

// ---------------------------------------------------------------------------
// SettingsCoordinator
// ---------------------------------------------------------------------------

/// Called when the user asks to log out.
pub type LogoutCallback = Arc<dyn Fn() + Send + Sync>;

pub struct SettingsCoordinator {
    node: NavNode,
    registry: Arc<Registry>,
    on_logout: LogoutCallback,
}

impl SettingsCoordinator {
    pub fn new(
        stack: Arc<NavigationStack>,
        registry: Arc<Registry>,
        on_logout: LogoutCallback,
    ) -> Arc<Self> {
        Arc::new(Self {
            node: NavNode::new("settings", stack),
            registry,
            on_logout,
        })
    }

    fn show_settings(self: &Arc<Self>) {
        let services = Services::resolve(&self.registry);
        let container = SettingsContainer::new(services.config.simulated_delay / 2);
        let screen = SettingsScreen::new(services.config.app_version);

        bind_surface(container.state(), screen.clone());
        let output = Arc::clone(&container).transform(screen.input());
        let scope = container.state().scope();

        let target = Arc::clone(&screen);
        scope.spawn(output.settings_loaded.for_each(move |()| {
            target.show_loaded();
            async {}
        }));

        scope.spawn(output.setting.for_each(|setting| {
            if !setting.is_logout() {
                info!("settings: would navigate to {}", setting.title());
            }
            async {}
        }));

        let on_logout = Arc::clone(&self.on_logout);
        scope.spawn(output.logout.for_each(move |()| {
            info!("settings: handling logout");
            on_logout();
            async {}
        }));

        self.node.own(container);
        self.node.stack().push(screen.clone());
        screen.did_load();
    }
}

impl Coordinator for SettingsCoordinator {
    fn node(&self) -> &NavNode {
        &self.node
    }

    fn start(self: Arc<Self>) {
        self.node.did_start();
        self.show_settings();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> (EventSink<()>, EventSink<(usize, usize)>, SettingsInput) {
        let load = EventSink::new();
        let selected = EventSink::new();
        let input = SettingsInput {
            load: load.subscribe(),
            setting_selected: selected.subscribe(),
        };
        (load, selected, input)
    }

    #[test]
    fn indices_resolve_to_typed_settings() {
        assert_eq!(
            Setting::from_index(0, 2),
            Some(Setting::Account(AccountSetting::Logout))
        );
        assert_eq!(
            Setting::from_index(3, 0),
            Some(Setting::About(AboutSetting::Version))
        );
        assert_eq!(Setting::from_index(1, 2), None);
        assert_eq!(Setting::from_index(4, 0), None);
        assert_eq!(Setting::Privacy(PrivacySetting::Permissions).title(), "App Permissions");
    }

    #[tokio::test]
    async fn load_emits_settings_loaded() {
        let settings = SettingsContainer::new(Duration::from_millis(5));
        let (load, _selected, input) = inputs();
        let mut output = Arc::clone(&settings).transform(input);

        load.send(());
        assert_eq!(output.settings_loaded.next().await, Some(()));
        assert!(!settings.state().busy().get());
    }

    #[tokio::test]
    async fn logout_row_raises_logout_intent() {
        let settings = SettingsContainer::new(Duration::from_millis(5));
        let (_load, selected, input) = inputs();
        let mut output = Arc::clone(&settings).transform(input);

        selected.send((9, 9));
        selected.send((2, 0));
        selected.send((0, 2));

        assert_eq!(
            output.setting.next().await,
            Some(Setting::Privacy(PrivacySetting::DataUsage))
        );
        assert_eq!(
            output.setting.next().await,
            Some(Setting::Account(AccountSetting::Logout))
        );
        assert_eq!(output.logout.next().await, Some(()));
    }

    #[test]
    fn screen_lists_rows_once_loaded() {
        let screen = SettingsScreen::new("1.2.3");
        assert_eq!(screen.render(), vec!["== Settings =="]);
        screen.show_loaded();
        let lines = screen.render();
        assert!(lines.contains(&"  [0 2] Logout".to_string()));
        assert!(lines.contains(&"  [3 0] Version 1.2.3".to_string()));
    }
}
