//! Address bus built from a registry of memory-mapped devices.
//!
//! Devices are registered with an inclusive address range while the bus is
//! being assembled. [`AddressBus::lock`] then sorts the registry, rejects
//! overlapping ranges and freezes it. After that, every access is a binary
//! search over the sorted ranges.
//!
//! Accesses never fail. An address nobody owns, a device without a read
//! responder, or an access before the registry is locked all read back as
//! [`OPEN_BUS`] and drop writes, with a warning logged.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::{Bus, Observable, Value};

/// Value returned for reads nobody answers.
pub const OPEN_BUS: u8 = 0xFF;

/// A memory-mapped device.
///
/// The bus passes the raw address through unchanged; devices decode their
/// own offset within the range they were registered with. Both responders
/// are optional: the defaults describe a device that ignores writes and
/// does not drive the data bus on reads.
pub trait Device {
    /// Read responder. `None` means the device does not answer reads.
    fn read(&mut self, address: u16) -> Option<u8> {
        let _ = address;
        None
    }

    /// Write responder.
    fn write(&mut self, address: u16, value: u8) {
        let _ = (address, value);
    }
}

/// Shared devices: the bus holds one handle, the owning system another.
impl<D: Device + ?Sized> Device for Rc<RefCell<D>> {
    fn read(&mut self, address: u16) -> Option<u8> {
        self.borrow_mut().read(address)
    }

    fn write(&mut self, address: u16, value: u8) {
        self.borrow_mut().write(address, value);
    }
}

/// A device together with its display name and inclusive address range.
pub struct Mapping {
    name: String,
    start: u16,
    end: u16,
    device: Box<dyn Device>,
}

impl Mapping {
    /// Describe `device` as answering `start..=end`.
    pub fn new(name: impl Into<String>, start: u16, end: u16, device: impl Device + 'static) -> Self {
        Self {
            name: name.into(),
            start,
            end,
            device: Box::new(device),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn start(&self) -> u16 {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> u16 {
        self.end
    }

    #[must_use]
    pub fn contains(&self, address: u16) -> bool {
        (self.start..=self.end).contains(&address)
    }

    fn compare(&self, address: u16) -> Ordering {
        if self.end < address {
            Ordering::Less
        } else if self.start > address {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }
}

impl fmt::Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ${:04X}-${:04X}", self.name, self.start, self.end)
    }
}

/// Reasons assembling a bus can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Registration attempted after [`AddressBus::lock`].
    #[error("bus {bus} is locked; cannot register {device}")]
    Locked { bus: String, device: String },

    /// Range with start above end.
    #[error("device {device} has an empty range ${start:04X}-${end:04X}")]
    InvalidRange { device: String, start: u16, end: u16 },

    /// Two registered devices claim the same address.
    #[error("device {first} (${first_start:04X}-${first_end:04X}) overlaps {second} (${second_start:04X}-${second_end:04X})")]
    Overlap {
        first: String,
        first_start: u16,
        first_end: u16,
        second: String,
        second_start: u16,
        second_end: u16,
    },

    /// The registry could not grow.
    #[error("bus {bus} could not allocate room for {device}")]
    Exhausted { bus: String, device: String },
}

/// A named address space of memory-mapped devices.
pub struct AddressBus {
    name: String,
    devices: Vec<Mapping>,
    locked: bool,
}

impl AddressBus {
    /// Create an empty, unlocked bus.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            devices: Vec::new(),
            locked: false,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Number of registered devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Add a device. Nothing changes if this fails.
    pub fn register(&mut self, mapping: Mapping) -> Result<(), RegistryError> {
        if self.locked {
            return Err(RegistryError::Locked {
                bus: self.name.clone(),
                device: mapping.name,
            });
        }
        if mapping.start > mapping.end {
            return Err(RegistryError::InvalidRange {
                device: mapping.name,
                start: mapping.start,
                end: mapping.end,
            });
        }
        if self.devices.try_reserve(1).is_err() {
            return Err(RegistryError::Exhausted {
                bus: self.name.clone(),
                device: mapping.name,
            });
        }

        debug!(bus = %self.name, device = ?mapping, "registered device");
        self.devices.push(mapping);
        Ok(())
    }

    /// Sort, validate and freeze the registry.
    ///
    /// On overlap the registry stays unlocked and the error names the first
    /// offending pair in address order.
    pub fn lock(&mut self) -> Result<(), RegistryError> {
        self.devices.shrink_to_fit();
        self.devices.sort_by_key(|m| (m.start, m.end));

        if let Some(pair) = self.devices.windows(2).find(|w| w[1].start <= w[0].end) {
            let (first, second) = (&pair[0], &pair[1]);
            return Err(RegistryError::Overlap {
                first: first.name.clone(),
                first_start: first.start,
                first_end: first.end,
                second: second.name.clone(),
                second_start: second.start,
                second_end: second.end,
            });
        }

        self.locked = true;
        debug!(bus = %self.name, devices = self.devices.len(), "registry locked");
        Ok(())
    }

    /// Name of the device owning `address`, if any. Only meaningful once locked.
    #[must_use]
    pub fn device_at(&self, address: u16) -> Option<&str> {
        self.find(address).map(|i| self.devices[i].name.as_str())
    }

    /// Names of registered devices, in registry order.
    pub fn device_names(&self) -> impl Iterator<Item = &str> {
        self.devices.iter().map(|m| m.name.as_str())
    }

    fn find(&self, address: u16) -> Option<usize> {
        if !self.locked {
            return None;
        }
        self.devices
            .binary_search_by(|m| m.compare(address))
            .ok()
    }
}

impl Bus for AddressBus {
    fn read(&mut self, address: u16) -> u8 {
        if !self.locked {
            warn!(bus = %self.name, address = format_args!("${address:04X}"), "read before registry lock");
            return OPEN_BUS;
        }
        let Some(index) = self.find(address) else {
            warn!(bus = %self.name, address = format_args!("${address:04X}"), "unmapped read");
            return OPEN_BUS;
        };
        self.devices[index].device.read(address).unwrap_or(OPEN_BUS)
    }

    fn write(&mut self, address: u16, value: u8) {
        if !self.locked {
            warn!(bus = %self.name, address = format_args!("${address:04X}"), value, "write before registry lock");
            return;
        }
        let Some(index) = self.find(address) else {
            warn!(bus = %self.name, address = format_args!("${address:04X}"), value, "unmapped write");
            return;
        };
        self.devices[index].device.write(address, value);
    }
}

impl Observable for AddressBus {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "name" => Some(self.name.as_str().into()),
            "locked" => Some(self.locked.into()),
            "devices" => Some(Value::Array(
                self.devices
                    .iter()
                    .map(|m| Value::String(format!("{m:?}")))
                    .collect(),
            )),
            _ => {
                let address = crate::parse_address(path.strip_prefix("owner.")?)?;
                Some(self.device_at(address).unwrap_or("unmapped").into())
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["name", "locked", "devices", "owner.<address>"]
    }
}

impl fmt::Debug for AddressBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddressBus")
            .field("name", &self.name)
            .field("locked", &self.locked)
            .field("devices", &self.devices)
            .finish()
    }
}
