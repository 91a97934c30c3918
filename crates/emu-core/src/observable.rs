//! Read-only state queries for debuggers and tests.
//!
//! Components answer dotted paths with a [`Value`]. Answering a query must
//! never change emulation state, so memory-mapped registers with read side
//! effects are not reachable through it.

use std::fmt;

/// A queried value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    U16(u16),
    /// Signed, for the PPU's pre-render scanline (-1).
    I16(i16),
    U64(u64),
    String(String),
    Array(Vec<Value>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::U8(byte) => write!(f, "{byte:#04X}"),
            Value::U16(word) => write!(f, "{word:#06X}"),
            Value::Bool(flag) => flag.fmt(f),
            Value::I16(n) => n.fmt(f),
            Value::U64(n) => n.fmt(f),
            Value::String(text) => f.write_str(text),
            Value::Array(items) => {
                f.write_str("[")?;
                let mut sep = "";
                for item in items {
                    write!(f, "{sep}{item}")?;
                    sep = ", ";
                }
                f.write_str("]")
            }
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    u8 => U8,
    u16 => U16,
    i16 => I16,
    u64 => U64,
    String => String,
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::String(text.to_owned())
    }
}

/// A component whose state can be inspected.
pub trait Observable {
    /// Look up one value by dotted path (`pc`, `flags.z`,
    /// `ppu.scanline`). `None` for paths the component does not know.
    fn query(&self, path: &str) -> Option<Value>;

    /// Paths accepted by [`query`](Self::query); `<...>` marks a family.
    fn query_paths(&self) -> &'static [&'static str];
}

/// Parse an address written as `0x1234`, `$1234` or decimal.
#[must_use]
pub fn parse_address(text: &str) -> Option<u16> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16).ok()
    } else if let Some(hex) = text.strip_prefix('$') {
        u16::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}
