//! MOS 6502 CPU core, as found in the NES's 2A03 (no decimal mode).
//!
//! Each instruction executes in full on the cycle its opcode is fetched.
//! A remaining-cycle counter then keeps the CPU idle for the rest of the
//! instruction's documented duration, so `tick()` still advances exactly
//! one machine cycle.
//!
//! Decoding is data driven: [`OPCODES`] maps every opcode byte to an
//! [`Operation`], an [`AddressingMode`] and a base cycle count. The same
//! table drives execution and the [`disassemble`] window.

mod cpu;
mod disasm;
pub mod flags;
mod opcodes;
mod registers;

pub use cpu::{IRQ_VECTOR, Mos6502, NMI_VECTOR, RESET_VECTOR};
pub use disasm::{Disassembly, disassemble, disassemble_one};
pub use flags::Status;
pub use opcodes::{AddressingMode, Instruction, OPCODES, Operation};
pub use registers::Registers;
