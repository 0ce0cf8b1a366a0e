//! The input/output contract of a state container.
//!
//! A container declares an input bundle (one event stream per recognised
//! user or lifecycle event) and an output bundle (one stream per derived
//! presentation value). [`Transform::transform`] wires the two together: it
//! subscribes to the inputs inside the container's scope and returns outputs
//! that are views over the container's sinks. It never blocks.
//!
//! ```rust,ignore
//! struct CounterInput { pub tap: Events<()> }
//! struct CounterOutput { pub count: Signal<u32> }
//!
//! impl Transform for Counter {
//!     type Input = CounterInput;
//!     type Output = CounterOutput;
//!
//!     fn transform(self: Arc<Self>, input: CounterInput) -> CounterOutput {
//!         let output = CounterOutput { count: self.count.signal() };
//!         if !self.state.begin_transform() {
//!             return output;
//!         }
//!         let count = self.count.clone();
//!         self.state.scope().spawn(input.tap.for_each(move |()| {
//!             count.set(count.get() + 1);
//!             async {}
//!         }));
//!         output
//!     }
//! }
//! ```

use std::sync::Arc;

use crate::container::Container;

/// Transforms a bundle of input streams into a bundle of output streams.
///
/// Called once per instance, right after construction and before a surface
/// subscribes to the outputs. Subscription tasks should hold the container
/// weakly so that dropping the last owner tears it down.
pub trait Transform: Container {
    type Input;
    type Output;

    fn transform(self: Arc<Self>, input: Self::Input) -> Self::Output;
}
