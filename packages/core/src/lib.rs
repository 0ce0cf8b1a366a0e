//! Presentation architecture core for reactive client applications.
//!
//! Each screen is backed by a state container that turns a bundle of input
//! streams into a bundle of output streams. Navigation is a tree of
//! coordinators, each owning its children, and shared services come from an
//! explicitly constructed registry.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`stream`] | Value and event sinks, busy tracking and error routing ([`StreamTrackExt`]) |
//! | [`scope`] | [`Scope`]: the subscriptions a container owns, cancelled as a unit |
//! | [`container`] | [`StateContainer`]: busy flag, last error and scope |
//! | [`transform`] | [`Transform`]: the input/output contract |
//! | [`surface`] | [`Surface`]: what a screen can show, and [`bind_surface`] |
//! | [`navigation`] | [`Coordinator`], [`NavNode`] and [`NavigationStack`] |
//! | [`registry`] | [`Registry`]: keyed shared services |
//! | [`error`] | [`PresentationError`] |
//!
//! # Quick start
//!
//! ```rust,ignore
//! use armature::{StateContainer, StreamTrackExt};
//!
//! let state = StateContainer::new("home");
//! let items = network
//!     .execute::<Vec<Item>>(request)
//!     .track_and_route(state.busy().clone(), state.last_error().clone());
//! ```

pub mod container;
pub mod error;
pub mod navigation;
pub mod registry;
pub mod scope;
pub mod stream;
pub mod surface;
pub mod transform;

pub use container::{Container, LastError, StateContainer, StateView};
pub use error::PresentationError;
pub use navigation::{Coordinator, NavNode, NavigationStack, NodeId, NodeState};
pub use registry::Registry;
pub use scope::Scope;
pub use stream::{
    for_each_latest, Emitter, EventSink, Events, RouteErrors, Signal, StreamTrackExt, TrackBusy,
    ValueSlot,
};
pub use surface::{bind_surface, Gesture, Surface};
pub use transform::Transform;
