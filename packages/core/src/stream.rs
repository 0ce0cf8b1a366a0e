//! Reactive stream utilities.
//!
//! State containers publish presentation state through two kinds of sink:
//!
//! | Sink | Replays latest value? | Backed by |
//! |------|-----------------------|-----------|
//! | [`ValueSlot`] | yes | `tokio::sync::watch` (+ a lossless change feed) |
//! | [`EventSink`] | no | `tokio::sync::broadcast` |
//!
//! Both are gated by a [`CancellationToken`]. Once the owning scope is
//! cancelled every write is a silent no-op, so a late network result can
//! never reach presentation state that has already been torn down.
//!
//! [`StreamTrackExt`] attaches busy tracking and error routing to any stream
//! of `Result`s, and [`for_each_latest`] drives one operation per trigger.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::stream::{BoxStream, Stream, StreamExt};
use tokio::sync::{broadcast, watch};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::{BroadcastStream, WatchStream};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Buffered events per subscriber before a slow subscriber starts lagging.
const EVENT_CAPACITY: usize = 64;

/// A boxed stream of user or lifecycle events feeding a container.
pub type Events<T> = BoxStream<'static, T>;

/// A boxed stream of presentation values produced by a container.
pub type Signal<T> = BoxStream<'static, T>;

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Anything a stream utility can write into.
pub trait Emitter<T>: Send + Sync {
    fn emit(&self, value: T);
}

impl<T, E> Emitter<T> for Arc<E>
where
    E: Emitter<T> + ?Sized,
{
    fn emit(&self, value: T) {
        (**self).emit(value)
    }
}

// ---------------------------------------------------------------------------
// ValueSlot
// ---------------------------------------------------------------------------

/// A current-value cell. New subscribers immediately see the latest value.
///
/// Every write is also published on a lossless change feed
/// ([`ValueSlot::changes`]) for observers that must not miss transitions.
pub struct ValueSlot<T> {
    current: Arc<watch::Sender<T>>,
    changes: broadcast::Sender<T>,
    gate: CancellationToken,
}

impl<T> Clone for ValueSlot<T> {
    fn clone(&self) -> Self {
        Self {
            current: Arc::clone(&self.current),
            changes: self.changes.clone(),
            gate: self.gate.clone(),
        }
    }
}

impl<T> ValueSlot<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// An ungated slot. Writes always land.
    pub fn new(initial: T) -> Self {
        Self::gated(initial, CancellationToken::new())
    }

    /// A slot that ignores writes once `gate` is cancelled.
    pub fn gated(initial: T, gate: CancellationToken) -> Self {
        let (current, _) = watch::channel(initial);
        let (changes, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            current: Arc::new(current),
            changes,
            gate,
        }
    }

    pub fn set(&self, value: T) {
        if self.gate.is_cancelled() {
            return;
        }
        self.current.send_replace(value.clone());
        // No subscribers is not an error.
        let _ = self.changes.send(value);
    }

    pub fn get(&self) -> T {
        self.current.borrow().clone()
    }

    /// Whether writes are still accepted.
    pub fn is_open(&self) -> bool {
        !self.gate.is_cancelled()
    }

    /// A raw `watch` receiver over the current value.
    pub fn watch(&self) -> watch::Receiver<T> {
        self.current.subscribe()
    }

    /// The latest value followed by every later value (intermediate values
    /// may be coalesced under load).
    pub fn signal(&self) -> Signal<T> {
        WatchStream::new(self.current.subscribe()).boxed()
    }

    /// Every write made after this call, in order, without replay.
    pub fn changes(&self) -> Signal<T> {
        lossless(self.changes.subscribe())
    }
}

impl<T> Emitter<T> for ValueSlot<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn emit(&self, value: T) {
        self.set(value);
    }
}

// ---------------------------------------------------------------------------
// EventSink
// ---------------------------------------------------------------------------

/// A pass-through sink: subscribers only see events sent after they subscribed.
pub struct EventSink<T> {
    tx: broadcast::Sender<T>,
    gate: CancellationToken,
}

impl<T> Clone for EventSink<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            gate: self.gate.clone(),
        }
    }
}

impl<T> Default for EventSink<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventSink<T>
where
    T: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self::gated(CancellationToken::new())
    }

    pub fn gated(gate: CancellationToken) -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx, gate }
    }

    pub fn send(&self, value: T) {
        if self.gate.is_cancelled() {
            return;
        }
        let _ = self.tx.send(value);
    }

    pub fn subscribe(&self) -> Signal<T> {
        lossless(self.tx.subscribe())
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<T> Emitter<T> for EventSink<T>
where
    T: Clone + Send + 'static,
{
    fn emit(&self, value: T) {
        self.send(value);
    }
}

fn lossless<T>(rx: broadcast::Receiver<T>) -> Signal<T>
where
    T: Clone + Send + 'static,
{
    BroadcastStream::new(rx)
        .filter_map(|item| async move {
            match item {
                Ok(value) => Some(value),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!("stream: subscriber lagged, {skipped} events dropped");
                    None
                }
            }
        })
        .boxed()
}

// ---------------------------------------------------------------------------
// Busy tracking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activity {
    Idle,
    Active,
    Finished,
}

/// Stream returned by [`StreamTrackExt::track_busy`].
///
/// Emits `true` on the first poll and `false` exactly once when the inner
/// stream ends or the wrapper is dropped, whichever happens first.
pub struct TrackBusy<S, B>
where
    B: Emitter<bool>,
{
    inner: Pin<Box<S>>,
    busy: B,
    activity: Activity,
}

impl<S, B> TrackBusy<S, B>
where
    B: Emitter<bool>,
{
    fn finish(&mut self) {
        if self.activity == Activity::Active {
            self.busy.emit(false);
        }
        self.activity = Activity::Finished;
    }
}

impl<S, B> Stream for TrackBusy<S, B>
where
    S: Stream,
    B: Emitter<bool> + Unpin,
{
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.activity {
            Activity::Finished => return Poll::Ready(None),
            Activity::Idle => {
                this.busy.emit(true);
                this.activity = Activity::Active;
            }
            Activity::Active => {}
        }

        match this.inner.as_mut().poll_next(cx) {
            Poll::Ready(None) => {
                this.finish();
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

impl<S, B> Drop for TrackBusy<S, B>
where
    B: Emitter<bool>,
{
    fn drop(&mut self) {
        self.finish();
    }
}

// ---------------------------------------------------------------------------
// Error routing
// ---------------------------------------------------------------------------

/// Stream returned by [`StreamTrackExt::route_errors`].
///
/// Passes `Ok` values through. The first `Err` drops the upstream, is written
/// to the error sink, and ends this stream without a value.
pub struct RouteErrors<S, R> {
    inner: Option<Pin<Box<S>>>,
    errors: R,
}

impl<S, R, T, E> Stream for RouteErrors<S, R>
where
    S: Stream<Item = Result<T, E>>,
    R: Emitter<E> + Unpin,
{
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = self.get_mut();
        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };

        match inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(value))) => Poll::Ready(Some(value)),
            Poll::Ready(Some(Err(error))) => {
                // Release the upstream first so busy tracking settles before
                // the error becomes visible.
                this.inner = None;
                this.errors.emit(error);
                Poll::Ready(None)
            }
            Poll::Ready(None) => {
                this.inner = None;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

// ---------------------------------------------------------------------------
// Extension trait
// ---------------------------------------------------------------------------

/// Busy tracking and error routing for any stream.
///
/// ```rust,ignore
/// let items = network
///     .execute::<Vec<Item>>(request)
///     .track_and_route(state.busy().clone(), state.last_error().clone());
/// ```
pub trait StreamTrackExt: Stream + Sized {
    /// Push `true` into `busy` when the stream is first polled and `false`
    /// once when it completes or is dropped.
    fn track_busy<B>(self, busy: B) -> TrackBusy<Self, B>
    where
        B: Emitter<bool>,
    {
        TrackBusy {
            inner: Box::pin(self),
            busy,
            activity: Activity::Idle,
        }
    }

    /// Divert the first failure into `errors` and complete without a value.
    fn route_errors<T, E, R>(self, errors: R) -> RouteErrors<Self, R>
    where
        Self: Stream<Item = Result<T, E>>,
        R: Emitter<E>,
    {
        RouteErrors {
            inner: Some(Box::pin(self)),
            errors,
        }
    }

    /// [`track_busy`](Self::track_busy) wrapped by
    /// [`route_errors`](Self::route_errors).
    fn track_and_route<T, E, B, R>(self, busy: B, errors: R) -> RouteErrors<TrackBusy<Self, B>, R>
    where
        Self: Stream<Item = Result<T, E>>,
        B: Emitter<bool> + Unpin,
        R: Emitter<E>,
    {
        self.track_busy(busy).route_errors(errors)
    }
}

impl<S: Stream> StreamTrackExt for S {}

// ---------------------------------------------------------------------------
// Trigger driving
// ---------------------------------------------------------------------------

/// Run `operation` for every trigger and feed its values to `on_value`.
///
/// A new trigger drops the operation still in flight before starting the
/// next one, so a superseded operation settles (and releases its busy flag)
/// strictly before its successor begins. When the trigger stream ends the
/// last operation is allowed to finish.
pub async fn for_each_latest<T, O, F, G>(mut triggers: Events<T>, mut operation: F, mut on_value: G)
where
    F: FnMut(T) -> BoxStream<'static, O>,
    G: FnMut(O),
{
    let mut current: Option<BoxStream<'static, O>> = None;

    loop {
        tokio::select! {
            trigger = triggers.next() => match trigger {
                Some(trigger) => {
                    current.take();
                    current = Some(operation(trigger));
                }
                None => break,
            },
            value = next_in_flight(&mut current) => match value {
                Some(value) => on_value(value),
                None => current = None,
            },
        }
    }

    if let Some(mut last) = current {
        while let Some(value) = last.next().await {
            on_value(value);
        }
    }
}

async fn next_in_flight<O>(current: &mut Option<BoxStream<'static, O>>) -> Option<O> {
    match current {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
