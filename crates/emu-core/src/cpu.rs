//! CPU core trait.

use crate::Bus;

/// A CPU core.
///
/// CPUs take the bus by reference on every call rather than owning it, so
/// the same bus can also be reached by the system that drives the CPU
/// (for example to deliver an interrupt between clocks).
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Advance the CPU by one machine cycle.
    fn tick<B: Bus>(&mut self, bus: &mut B);

    /// Returns the current program counter.
    fn pc(&self) -> u16;

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Enter the non-maskable interrupt handler.
    ///
    /// Must only be called between instructions.
    fn nmi<B: Bus>(&mut self, bus: &mut B);

    /// Reset the CPU to its power-up state, loading PC from the reset vector.
    fn reset<B: Bus>(&mut self, bus: &mut B);
}
