//! Trait for components that can be advanced by bus cycles.

use crate::Ticks;

/// A component that can be advanced by bus cycles.
///
/// The driving CPU core runs in bursts, so components are frequently
/// advanced by many cycles at once. `tick_n(n)` must leave the component in
/// exactly the state that `n` calls to `tick()` would, including any
/// externally sampled outputs.
pub trait Tickable {
    /// Advance the component by one bus cycle.
    fn tick(&mut self);

    /// Advance the component by multiple bus cycles.
    ///
    /// Default implementation calls `tick()` in a loop. Components override
    /// it with a coalesced implementation that carries surplus cycles
    /// between phases.
    fn tick_n(&mut self, count: Ticks) {
        for _ in 0..count.get() {
            self.tick();
        }
    }
}
