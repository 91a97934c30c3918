//! Top-level NES system.
//!
//! The system clock runs at the PPU dot rate (5,369,318 Hz on NTSC). Each
//! tick advances the PPU one dot, the CPU one cycle on every third tick,
//! and then delivers any NMI the PPU raised during that dot. The order is
//! fixed: PPU, CPU, NMI.
//!
//! One frame = 341 dots × 262 scanlines = 89,342 ticks (one fewer on odd
//! frames while the background is enabled).

use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use emu_core::{
    AddressBus, Bus, Cpu, Mapping, OPEN_BUS, Observable, Tickable, Ticks, Value, parse_address,
};
use mos_6502::{Disassembly, Mos6502, disassemble};
use nes_cartridge::{Cartridge, ChrDevice, PrgDevice, SharedCartridge};
use ricoh_ppu_2c02::{Framebuffer, Ppu, VideoMemory, video_bus};
use tracing::{debug, info, trace};

use crate::config::NesConfig;
use crate::ram::Ram;
use crate::NesError;

/// System ticks per CPU cycle.
const CPU_DIVISOR: u64 = 3;

/// Asks a running [`Nes::run_until`] to return.
///
/// Clones share one flag, so a handle can be given to another thread
/// (a UI or a debugger front end) while the emulator runs.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Request a stop. Takes effect between ticks.
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Consume a pending request.
    fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

/// Why [`Nes::run_until`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The predicate held.
    Condition,
    /// A [`StopHandle`] asked for a stop.
    Stopped,
}

/// NES system.
pub struct Nes {
    cpu: Mos6502,
    cpu_bus: AddressBus,
    ppu: Rc<RefCell<Ppu>>,
    ram: Rc<RefCell<Ram>>,
    cartridge: SharedCartridge,
    framebuffer: Framebuffer,
    /// NMI raised by the PPU, waiting for delivery to the CPU.
    nmi_line: bool,
    /// Set when the PPU finished a frame during the last tick.
    frame_ready: bool,
    system_counter: Ticks,
    stop: StopHandle,
}

impl Nes {
    /// Build the system from an iNES image and reset it.
    ///
    /// # Errors
    ///
    /// Returns an error if the image is invalid or a bus cannot be
    /// assembled.
    pub fn new(config: &NesConfig) -> Result<Self, NesError> {
        let cartridge = Cartridge::from_ines(&config.rom_data)?.into_shared();

        let video_memory = Rc::new(RefCell::new(VideoMemory::new()));
        let mirroring_source = Rc::clone(&cartridge);
        let video = video_bus(
            &video_memory,
            ChrDevice(Rc::clone(&cartridge)),
            move || mirroring_source.borrow().mirroring(),
        )?;
        let ppu = Rc::new(RefCell::new(Ppu::new(video)));
        let ram = Rc::new(RefCell::new(Ram::new()));

        let mut cpu_bus = AddressBus::new("cpu");
        cpu_bus.register(Mapping::new("RAM", 0x0000, 0x1FFF, Rc::clone(&ram)))?;
        cpu_bus.register(Mapping::new("PPU", 0x2000, 0x3FFF, Rc::clone(&ppu)))?;
        cpu_bus.register(Mapping::new(
            "CARTRIDGE",
            0x4020,
            0xFFFF,
            PrgDevice(Rc::clone(&cartridge)),
        ))?;
        cpu_bus.lock()?;
        debug!(
            devices = ?cpu_bus.device_names().collect::<Vec<_>>(),
            "CPU bus assembled"
        );

        let mut nes = Self {
            cpu: Mos6502::new(),
            cpu_bus,
            ppu,
            ram,
            cartridge,
            framebuffer: Framebuffer::new(),
            nmi_line: false,
            frame_ready: false,
            system_counter: Ticks::ZERO,
            stop: StopHandle::default(),
        };
        nes.reset();
        Ok(nes)
    }

    /// Reset the PPU and the CPU, then run the clock until the CPU has
    /// finished its reset sequence. The system counter restarts at zero.
    pub fn reset(&mut self) {
        self.ppu.borrow_mut().reset(&mut self.framebuffer);
        self.cpu.reset(&mut self.cpu_bus);
        self.nmi_line = false;

        while !self.cpu.is_instruction_complete() {
            self.tick();
        }
        self.system_counter = Ticks::ZERO;
        self.frame_ready = false;
        info!(pc = format_args!("${:04X}", self.cpu.pc()), "NES reset");
    }

    /// Run until the PPU completes a frame. Returns the ticks executed.
    pub fn run_frame(&mut self) -> Ticks {
        let start = self.system_counter;
        self.frame_ready = false;
        while !self.frame_ready {
            self.tick();
        }
        self.frame_ready = false;
        self.system_counter - start
    }

    /// Run until the CPU has executed one whole instruction, including
    /// any NMI entry that lands on it. Returns the ticks executed.
    pub fn step_instruction(&mut self) -> Ticks {
        let start = self.system_counter;
        while self.cpu.is_instruction_complete() {
            self.tick();
        }
        while !self.cpu.is_instruction_complete() {
            self.tick();
        }
        self.system_counter - start
    }

    /// Tick until `done` holds or a stop is requested through
    /// [`stop_handle`](Self::stop_handle). Both are checked between ticks,
    /// before the first one.
    pub fn run_until(&mut self, mut done: impl FnMut(&Nes) -> bool) -> RunOutcome {
        loop {
            if self.stop.take() {
                debug!(counter = self.system_counter.get(), "run stopped");
                return RunOutcome::Stopped;
            }
            if done(self) {
                return RunOutcome::Condition;
            }
            self.tick();
        }
    }

    /// A handle that stops [`run_until`](Self::run_until) from elsewhere.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Reference to the CPU.
    #[must_use]
    pub fn cpu(&self) -> &Mos6502 {
        &self.cpu
    }

    /// Mutable reference to the CPU.
    pub fn cpu_mut(&mut self) -> &mut Mos6502 {
        &mut self.cpu
    }

    /// The CPU address space. Reads through it have the same side effects
    /// as CPU reads.
    pub fn cpu_bus_mut(&mut self) -> &mut AddressBus {
        &mut self.cpu_bus
    }

    #[must_use]
    pub fn ppu(&self) -> Ref<'_, Ppu> {
        self.ppu.borrow()
    }

    #[must_use]
    pub fn cartridge(&self) -> Ref<'_, Cartridge> {
        self.cartridge.borrow()
    }

    /// The 256x240 picture, 0xRRGGBB.
    #[must_use]
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Ticks since the last reset.
    #[must_use]
    pub fn system_counter(&self) -> Ticks {
        self.system_counter
    }

    /// Frames the PPU has completed.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.ppu.borrow().frame_count()
    }

    /// Read CPU memory without side effects. Only work RAM and the
    /// cartridge are visible; PPU registers and unmapped space are `None`.
    #[must_use]
    pub fn peek(&self, address: u16) -> Option<u8> {
        match address {
            0x0000..=0x1FFF => Some(self.ram.borrow().peek(address)),
            0x4020..=0xFFFF => self.cartridge.borrow().cpu_read(address),
            _ => None,
        }
    }

    /// Decode `count` instructions from `start` without disturbing the
    /// machine. Bytes [`peek`](Self::peek) cannot see read as open bus.
    #[must_use]
    pub fn disassemble(&self, start: u16, count: usize) -> Vec<Disassembly> {
        disassemble(&mut PeekBus(self), start, count)
    }
}

/// Side-effect-free view of CPU memory. Writes are dropped.
struct PeekBus<'a>(&'a Nes);

impl Bus for PeekBus<'_> {
    fn read(&mut self, address: u16) -> u8 {
        self.0.peek(address).unwrap_or(OPEN_BUS)
    }

    fn write(&mut self, _address: u16, _value: u8) {}
}

impl Tickable for Nes {
    fn tick(&mut self) {
        {
            let mut ppu = self.ppu.borrow_mut();
            ppu.tick(&mut self.framebuffer);
            if ppu.take_nmi() {
                self.nmi_line = true;
            }
            if ppu.take_frame_complete() {
                self.frame_ready = true;
                trace!(frame = ppu.frame_count(), "frame complete");
            }
        }

        if self.system_counter.is_multiple_of(CPU_DIVISOR) {
            self.cpu.tick(&mut self.cpu_bus);
        }

        if std::mem::take(&mut self.nmi_line) {
            self.cpu.nmi(&mut self.cpu_bus);
        }

        self.system_counter += Ticks::new(1);
    }
}

impl Observable for Nes {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("cpu.") {
            self.cpu.query(rest)
        } else if let Some(rest) = path.strip_prefix("ppu.") {
            self.ppu.borrow().query(rest)
        } else if let Some(rest) = path.strip_prefix("bus.") {
            self.cpu_bus.query(rest)
        } else if let Some(rest) = path.strip_prefix("memory.") {
            parse_address(rest)
                .and_then(|addr| self.peek(addr))
                .map(Value::U8)
        } else {
            match path {
                "system_counter" => Some(self.system_counter.get().into()),
                "frame_count" => Some(self.frame_count().into()),
                "nmi_line" => Some(self.nmi_line.into()),
                "mapper" => Some(self.cartridge.borrow().mapper_id().into()),
                _ => None,
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "cpu.<6502_paths>",
            "ppu.<2c02_paths>",
            "bus.<path>",
            "memory.<address>",
            "system_counter",
            "frame_count",
            "nmi_line",
            "mapper",
        ]
    }
}
