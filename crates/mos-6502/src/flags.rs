//! 6502 processor status register (P).
//!
//! Bit layout, low to high: `C Z I D B U V N`.

/// Carry flag - set if operation resulted in carry/borrow.
pub const C: u8 = 0x01;

/// Zero flag - set if result is zero.
pub const Z: u8 = 0x02;

/// Interrupt disable - when set, IRQ interrupts are ignored.
pub const I: u8 = 0x04;

/// Decimal mode. Stored and pushed, but the 2A03 has no BCD arithmetic.
pub const D: u8 = 0x08;

/// Break flag - not a real flag, only appears when status is pushed.
/// Set when BRK/PHP push status, clear when NMI pushes status.
pub const B: u8 = 0x10;

/// Unused bit - always reads as 1.
pub const U: u8 = 0x20;

/// Overflow flag - set if signed arithmetic overflowed.
pub const V: u8 = 0x40;

/// Negative flag - set if result has bit 7 set.
pub const N: u8 = 0x80;

/// Processor status register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status(pub u8);

impl Default for Status {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! flag_accessors {
    ($($(#[$doc:meta])* $flag:ident => $get:ident, $set:ident;)*) => {
        $(
            $(#[$doc])*
            #[must_use]
            pub const fn $get(self) -> bool {
                self.0 & $flag != 0
            }

            pub fn $set(&mut self, on: bool) {
                self.set_if($flag, on);
            }
        )*
    };
}

impl Status {
    /// Create a new status register with only the unused bit set.
    #[must_use]
    pub const fn new() -> Self {
        Self(U)
    }

    /// Status as restored by PLP/RTI: unused forced on, break dropped.
    #[must_use]
    pub const fn from_stack(value: u8) -> Self {
        Self((value | U) & !B)
    }

    /// Byte pushed by BRK and PHP (break and unused both set).
    #[must_use]
    pub const fn to_byte_brk(self) -> u8 {
        self.0 | U | B
    }

    /// Byte pushed by NMI (unused set, break clear).
    #[must_use]
    pub const fn to_byte_irq(self) -> u8 {
        (self.0 | U) & !B
    }

    /// Check if a flag is set.
    #[must_use]
    pub const fn is_set(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    /// Set or clear a flag based on condition.
    pub fn set_if(&mut self, flag: u8, condition: bool) {
        if condition {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }

    /// Update N and Z flags based on a value.
    pub fn update_nz(&mut self, value: u8) {
        self.set_if(N, value & 0x80 != 0);
        self.set_if(Z, value == 0);
    }

    flag_accessors! {
        C => carry, set_carry;
        Z => zero, set_zero;
        I => interrupt_disable, set_interrupt_disable;
        D => decimal, set_decimal;
        B => brk, set_brk;
        U => unused, set_unused;
        V => overflow, set_overflow;
        N => negative, set_negative;
    }
}
