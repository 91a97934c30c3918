//! Registry properties checked over the whole 16-bit address space.

use std::cell::RefCell;
use std::rc::Rc;

use emu_core::{AddressBus, Bus, Device, Mapping, OPEN_BUS};

/// Answers every read with a fixed tag and counts writes.
struct Tagged {
    tag: u8,
    writes: Rc<RefCell<u32>>,
}

impl Device for Tagged {
    fn read(&mut self, _address: u16) -> Option<u8> {
        Some(self.tag)
    }

    fn write(&mut self, _address: u16, _value: u8) {
        *self.writes.borrow_mut() += 1;
    }
}

const LAYOUT: [(&str, u16, u16); 5] = [
    ("PRG", 0x8000, 0xFFFF),
    ("RAM", 0x0000, 0x1FFF),
    ("PPU", 0x2000, 0x3FFF),
    ("SRAM", 0x6000, 0x7FFF),
    ("IO", 0x4016, 0x4017),
];

fn build(writes: &Rc<RefCell<u32>>) -> AddressBus {
    let mut bus = AddressBus::new("cpu");
    for (tag, &(name, start, end)) in LAYOUT.iter().enumerate() {
        let device = Tagged {
            tag: tag as u8,
            writes: Rc::clone(writes),
        };
        bus.register(Mapping::new(name, start, end, device))
            .expect("register");
    }
    bus.lock().expect("disjoint layout locks");
    bus
}

#[test]
fn every_address_resolves_to_its_containing_device() {
    let writes = Rc::new(RefCell::new(0));
    let mut bus = build(&writes);

    for address in 0..=u16::MAX {
        let owner = LAYOUT
            .iter()
            .position(|&(_, start, end)| (start..=end).contains(&address));

        assert_eq!(
            bus.device_at(address),
            owner.map(|i| LAYOUT[i].0),
            "owner of ${address:04X}"
        );
        let expected = owner.map_or(OPEN_BUS, |i| i as u8);
        assert_eq!(bus.read(address), expected, "read ${address:04X}");
    }
}

#[test]
fn unmapped_writes_reach_no_device() {
    let writes = Rc::new(RefCell::new(0));
    let mut bus = build(&writes);

    bus.write(0x4000, 0x55);
    bus.write(0x5000, 0x55);
    assert_eq!(*writes.borrow(), 0);

    bus.write(0x4016, 0x01);
    assert_eq!(*writes.borrow(), 1);
}

#[test]
fn registration_order_does_not_matter() {
    let writes = Rc::new(RefCell::new(0));
    let mut bus = AddressBus::new("cpu");
    for &(name, start, end) in LAYOUT.iter().rev() {
        let device = Tagged {
            tag: 0,
            writes: Rc::clone(&writes),
        };
        bus.register(Mapping::new(name, start, end, device))
            .expect("register");
    }
    bus.lock().expect("lock");

    let names: Vec<_> = bus.device_names().collect();
    assert_eq!(names, ["RAM", "PPU", "IO", "SRAM", "PRG"]);
}
