//! Core traits and types for cycle-stepped emulation.
//!
//! Components advance one clock at a time and talk to memory through a
//! [`Bus`]. The [`AddressBus`] is the concrete bus: a registry of address
//! range devices that is frozen before the first access.

mod address_bus;
mod bus;
mod cpu;
mod observable;
mod tickable;
mod ticks;

pub use address_bus::{AddressBus, Device, Mapping, OPEN_BUS, RegistryError};
pub use bus::Bus;
pub use cpu::Cpu;
pub use observable::{Observable, Value, parse_address};
pub use tickable::Tickable;
pub use ticks::Ticks;
