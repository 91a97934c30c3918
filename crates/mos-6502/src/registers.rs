//! Programmer-visible 6502 state.

use std::fmt;

use crate::Status;
use crate::flags::{B, C, D, I, N, U, V, Z};

/// Register file, also handed out as the `Cpu::registers()` snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    /// Stack pointer; the next push lands at `$0100 | s`.
    pub s: u8,
    pub pc: u16,
    pub p: Status,
}

impl Default for Registers {
    fn default() -> Self {
        Self::at_reset(0)
    }
}

impl Registers {
    /// State just after the reset sequence has loaded `pc` from its vector.
    ///
    /// The sequence performs three suppressed pushes, which leaves S at $FD,
    /// and masks IRQs.
    #[must_use]
    pub const fn at_reset(pc: u16) -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            s: 0xFD,
            pc,
            p: Status(U | I),
        }
    }

    /// Address of the stack slot S points at. The stack never leaves page one.
    #[must_use]
    pub fn stack_slot(self) -> u16 {
        0x0100 | u16::from(self.s)
    }
}

/// One-line dump, flags spelled `NV-BDIZC` with clear bits in lower case.
impl fmt::Display for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PC=${:04X} A=${:02X} X=${:02X} Y=${:02X} S=${:02X} P=",
            self.pc, self.a, self.x, self.y, self.s
        )?;
        for (flag, letter) in [
            (N, 'N'),
            (V, 'V'),
            (U, '-'),
            (B, 'B'),
            (D, 'D'),
            (I, 'I'),
            (Z, 'Z'),
            (C, 'C'),
        ] {
            let shown = if self.p.is_set(flag) {
                letter
            } else {
                letter.to_ascii_lowercase()
            };
            write!(f, "{shown}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_state_display() {
        let regs = Registers::at_reset(0xC000);
        assert_eq!(regs.stack_slot(), 0x01FD);
        assert_eq!(
            regs.to_string(),
            "PC=$C000 A=$00 X=$00 Y=$00 S=$FD P=nv-bdIzc"
        );
    }

    #[test]
    fn set_flags_upper_case() {
        let regs = Registers {
            a: 0x80,
            s: 0x00,
            p: Status(N | C | Z),
            ..Registers::default()
        };
        assert_eq!(regs.stack_slot(), 0x0100);
        assert!(regs.to_string().ends_with("S=$00 P=Nv-bdiZC"));
    }
}
