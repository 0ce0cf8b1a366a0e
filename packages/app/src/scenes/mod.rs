//! The three tab scenes. Each pairs a state container with a console
//! surface and a coordinator that owns both.

pub mod home;
pub mod profile;
pub mod settings;

pub use home::{DetailCoordinator, HomeContainer, HomeCoordinator, HomeInput, HomeItem, HomeOutput, HomeScreen};
pub use profile::{ProfileContainer, ProfileCoordinator, ProfileData, ProfileInput, ProfileOutput};
pub use settings::{
    LogoutCallback, Setting, SettingsContainer, SettingsCoordinator, SettingsInput, SettingsOutput,
    SettingsSection,
};
