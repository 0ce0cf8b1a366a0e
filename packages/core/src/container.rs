//! The state container every presentation unit is built on.
//!
//! A [`StateContainer`] carries the two slots every screen needs (`busy` and
//! `last_error`) plus the [`Scope`] that owns the container's subscriptions.
//! Concrete containers embed one and expose it through [`Container`].
//!
//! Only the container writes its slots. Surfaces and other observers get a
//! [`StateView`], which can read and subscribe but not write.
//!
//! # Lifecycle
//!
//! ```text
//! new() ──► transform(input) ──► ... ──► teardown()  (or Drop)
//!            (exactly once)               (drains the scope once)
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error};

use crate::error::PresentationError;
use crate::scope::Scope;
use crate::stream::{Emitter, Signal, ValueSlot};

// ---------------------------------------------------------------------------
// LastError
// ---------------------------------------------------------------------------

/// The error slot of a container. Accepts anything convertible into a
/// [`PresentationError`].
#[derive(Clone)]
pub struct LastError {
    slot: ValueSlot<Option<PresentationError>>,
}

impl LastError {
    fn new(slot: ValueSlot<Option<PresentationError>>) -> Self {
        Self { slot }
    }

    pub fn get(&self) -> Option<PresentationError> {
        self.slot.get()
    }

    pub fn clear(&self) {
        self.slot.set(None);
    }

    pub fn signal(&self) -> Signal<Option<PresentationError>> {
        self.slot.signal()
    }

    pub fn changes(&self) -> Signal<Option<PresentationError>> {
        self.slot.changes()
    }
}

impl<E> Emitter<E> for LastError
where
    E: Into<PresentationError>,
{
    fn emit(&self, value: E) {
        self.slot.set(Some(value.into()));
    }
}

// ---------------------------------------------------------------------------
// StateView
// ---------------------------------------------------------------------------

/// Read-only handle on a container's busy flag and error slot.
#[derive(Clone)]
pub struct StateView {
    busy: ValueSlot<bool>,
    last_error: ValueSlot<Option<PresentationError>>,
}

impl StateView {
    pub fn busy(&self) -> bool {
        self.busy.get()
    }

    pub fn last_error(&self) -> Option<PresentationError> {
        self.last_error.get()
    }

    /// Current busy flag, then every later value.
    pub fn busy_signal(&self) -> Signal<bool> {
        self.busy.signal()
    }

    /// Current error slot, then every later value.
    pub fn error_signal(&self) -> Signal<Option<PresentationError>> {
        self.last_error.signal()
    }
}

// ---------------------------------------------------------------------------
// StateContainer
// ---------------------------------------------------------------------------

/// Uniform busy/error surface plus scoped subscription ownership.
pub struct StateContainer {
    name: &'static str,
    busy: ValueSlot<bool>,
    last_error: LastError,
    scope: Scope,
    transformed: AtomicBool,
}

impl StateContainer {
    /// `busy = false`, `last_error = None`, empty scope.
    pub fn new(name: &'static str) -> Self {
        let scope = Scope::new(name);
        let busy = ValueSlot::gated(false, scope.token());
        let last_error = LastError::new(ValueSlot::gated(None, scope.token()));
        debug!("container: {name} initialised");
        Self {
            name,
            busy,
            last_error,
            scope,
            transformed: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Write side of the busy flag, for the owning container's pipelines.
    /// Hand observers a [`StateView`] instead.
    pub fn busy(&self) -> &ValueSlot<bool> {
        &self.busy
    }

    /// Write side of the error slot, for the owning container's pipelines.
    pub fn last_error(&self) -> &LastError {
        &self.last_error
    }

    /// A read-only handle for surfaces and other observers.
    pub fn view(&self) -> StateView {
        StateView {
            busy: self.busy.clone(),
            last_error: self.last_error.slot.clone(),
        }
    }

    pub fn busy_signal(&self) -> Signal<bool> {
        self.busy.signal()
    }

    pub fn error_signal(&self) -> Signal<Option<PresentationError>> {
        self.last_error.signal()
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Push an error straight into `last_error`.
    pub fn report(&self, error: impl Into<PresentationError>) {
        self.last_error.emit(error);
    }

    /// Claim the single `transform` call for this instance.
    ///
    /// Returns `false` (and logs) on every call after the first; the caller
    /// must then skip subscribing its inputs.
    pub fn begin_transform(&self) -> bool {
        if self.transformed.swap(true, Ordering::SeqCst) {
            error!("container: {} transformed more than once; inputs ignored", self.name);
            return false;
        }
        true
    }

    /// Cancel every subscription. Returns `true` only on the draining call.
    pub fn teardown(&self) -> bool {
        let drained = self.scope.cancel();
        if drained {
            debug!("container: {} torn down", self.name);
        }
        drained
    }

    pub fn is_torn_down(&self) -> bool {
        self.scope.is_cancelled()
    }
}

impl Drop for StateContainer {
    fn drop(&mut self) {
        self.teardown();
        debug!("container: {} deinitialised", self.name);
    }
}

/// Any presentation unit built on a [`StateContainer`].
pub trait Container: Send + Sync + 'static {
    fn state(&self) -> &StateContainer;
}
