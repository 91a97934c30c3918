//! Disassembly window for debuggers.
//!
//! Operands are read through the bus, so disassembling over memory-mapped
//! registers has the same side effects as the CPU reading them.

use std::fmt;

use emu_core::Bus;

use crate::opcodes::{AddressingMode, OPCODES};

/// One decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disassembly {
    /// Address of the opcode byte.
    pub address: u16,
    /// Opcode followed by operand bytes; only `len` entries are meaningful.
    pub bytes: [u8; 3],
    /// Number of bytes the instruction occupies (1 to 3).
    pub len: u8,
    /// Formatted mnemonic and operand, e.g. `LDA #$10`.
    pub text: String,
}

impl Disassembly {
    /// The instruction's raw bytes.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.bytes[..usize::from(self.len)]
    }

    /// Address of the instruction that follows this one.
    #[must_use]
    pub fn next_address(&self) -> u16 {
        self.address.wrapping_add(u16::from(self.len))
    }
}

impl fmt::Display for Disassembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut hex = String::with_capacity(8);
        for (i, byte) in self.raw().iter().enumerate() {
            if i > 0 {
                hex.push(' ');
            }
            hex.push_str(&format!("{byte:02X}"));
        }
        write!(f, "${:04X}  {hex:<8}  {}", self.address, self.text)
    }
}

/// Decode the instruction at `address`.
pub fn disassemble_one<B: Bus>(bus: &mut B, address: u16) -> Disassembly {
    let opcode = bus.read(address);
    let instruction = OPCODES[usize::from(opcode)];
    let len = instruction.byte_len();

    let mut bytes = [opcode, 0, 0];
    for (offset, slot) in (1..len).zip(bytes.iter_mut().skip(1)) {
        *slot = bus.read(address.wrapping_add(u16::from(offset)));
    }

    let name = instruction.mnemonic();
    let zp = bytes[1];
    let word = u16::from_le_bytes([bytes[1], bytes[2]]);
    let text = match instruction.mode {
        AddressingMode::Implied => name.to_string(),
        AddressingMode::Accumulator => format!("{name} A"),
        AddressingMode::Immediate => format!("{name} #${zp:02X}"),
        AddressingMode::ZeroPage => format!("{name} ${zp:02X}"),
        AddressingMode::ZeroPageX => format!("{name} ${zp:02X},X"),
        AddressingMode::ZeroPageY => format!("{name} ${zp:02X},Y"),
        AddressingMode::Absolute => format!("{name} ${word:04X}"),
        AddressingMode::AbsoluteX => format!("{name} ${word:04X},X"),
        AddressingMode::AbsoluteY => format!("{name} ${word:04X},Y"),
        AddressingMode::Indirect => format!("{name} (${word:04X})"),
        AddressingMode::IndexedIndirect => format!("{name} (${zp:02X},X)"),
        AddressingMode::IndirectIndexed => format!("{name} (${zp:02X}),Y"),
        AddressingMode::Relative => {
            let target = address
                .wrapping_add(2)
                .wrapping_add_signed(i16::from(zp as i8));
            format!("{name} ${target:04X}")
        }
    };

    Disassembly {
        address,
        bytes,
        len,
        text,
    }
}

/// Decode `count` consecutive instructions starting at `start`.
pub fn disassemble<B: Bus>(bus: &mut B, start: u16, count: usize) -> Vec<Disassembly> {
    let mut lines = Vec::with_capacity(count);
    let mut address = start;
    for _ in 0..count {
        let line = disassemble_one(bus, address);
        address = line.next_address();
        lines.push(line);
    }
    lines
}
