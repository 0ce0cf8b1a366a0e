//! `armature-app`: a demo client assembled from armature parts.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`config`] | [`AppConfig`](config::AppConfig), environment-driven |
//! | [`services`] | Shared services registered in the [`Registry`](armature::Registry) |
//! | [`fixtures`] | Offline transport serving canned items |
//! | [`console`] | Busy/error chrome shared by the text surfaces |
//! | [`scenes`] | Home, profile and settings scenes |
//! | [`tab_bar`] | The tab bar coordinator and surface |
//! | [`app`] | The root coordinator |
//! | [`shell`] | Line commands driving the visible surface |

pub mod app;
pub mod config;
pub mod console;
pub mod fixtures;
pub mod scenes;
pub mod services;
pub mod shell;
pub mod tab_bar;

pub use app::AppCoordinator;
pub use config::{AppConfig, Environment};
pub use fixtures::FixtureTransport;
pub use services::Services;
pub use shell::{Command, CommandError, Shell};
pub use tab_bar::{TabBarCoordinator, TabBarSurface};
