//! 6502 execution engine.
//!
//! `tick()` is one machine cycle. When no cycles remain from the previous
//! instruction, the tick fetches, decodes and executes the next instruction
//! in full, then loads the remaining-cycle counter with its base cost plus
//! any penalties. The following ticks only count that down.

use emu_core::{Bus, Cpu, Observable, Value};
use tracing::info;

use crate::Status;
use crate::flags::{C, D, I, N, V, Z};
use crate::opcodes::{AddressingMode, OPCODES, Operation};
use crate::registers::Registers;

/// NMI handler address.
pub const NMI_VECTOR: u16 = 0xFFFA;
/// Reset entry address.
pub const RESET_VECTOR: u16 = 0xFFFC;
/// IRQ/BRK handler address.
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// Cycles spent on reset and on entering the NMI handler.
const INTERRUPT_CYCLES: u8 = 8;

/// Where an instruction's operand lives once its addressing mode resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
    /// A (Implied and Accumulator modes).
    Accumulator,
    /// A memory address; Immediate resolves to the address of its operand byte.
    Memory(u16),
    /// Branch displacement.
    Relative(i8),
}

/// MOS 6502 CPU.
pub struct Mos6502 {
    /// CPU registers.
    pub regs: Registers,
    /// Cycles left before the next opcode fetch.
    cycles: u8,
    /// Opcode of the instruction executing now.
    opcode: u8,
    /// Total cycles elapsed.
    total_cycles: u64,
}

impl Default for Mos6502 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mos6502 {
    /// Create a CPU in power-up state. Call `reset` to load PC.
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: Registers::default(),
            cycles: 0,
            opcode: 0,
            total_cycles: 0,
        }
    }

    /// Cycles still owed by the current instruction.
    #[must_use]
    pub fn cycles_remaining(&self) -> u8 {
        self.cycles
    }

    /// True when the next tick will fetch a new opcode.
    #[must_use]
    pub fn is_instruction_complete(&self) -> bool {
        self.cycles == 0
    }

    /// Opcode of the most recently fetched instruction.
    #[must_use]
    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    /// Total cycles ticked since creation.
    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    // === Bus helpers ===

    fn fetch_byte<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let value = bus.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    fn fetch_word<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch_byte(bus);
        let hi = self.fetch_byte(bus);
        u16::from_le_bytes([lo, hi])
    }

    fn push<B: Bus>(&mut self, bus: &mut B, value: u8) {
        bus.write(self.regs.stack_slot(), value);
        self.regs.s = self.regs.s.wrapping_sub(1);
    }

    fn pull<B: Bus>(&mut self, bus: &mut B) -> u8 {
        self.regs.s = self.regs.s.wrapping_add(1);
        bus.read(self.regs.stack_slot())
    }

    fn push_word<B: Bus>(&mut self, bus: &mut B, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.push(bus, hi);
        self.push(bus, lo);
    }

    fn pull_word<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.pull(bus);
        let hi = self.pull(bus);
        u16::from_le_bytes([lo, hi])
    }

    // === Addressing ===

    /// Resolve the operand for `mode`, reporting whether indexing crossed a page.
    fn resolve<B: Bus>(&mut self, bus: &mut B, mode: AddressingMode) -> (Operand, bool) {
        match mode {
            AddressingMode::Implied | AddressingMode::Accumulator => (Operand::Accumulator, false),
            AddressingMode::Immediate => {
                let addr = self.regs.pc;
                self.regs.pc = self.regs.pc.wrapping_add(1);
                (Operand::Memory(addr), false)
            }
            AddressingMode::ZeroPage => {
                let zp = self.fetch_byte(bus);
                (Operand::Memory(u16::from(zp)), false)
            }
            AddressingMode::ZeroPageX => {
                let zp = self.fetch_byte(bus).wrapping_add(self.regs.x);
                (Operand::Memory(u16::from(zp)), false)
            }
            AddressingMode::ZeroPageY => {
                let zp = self.fetch_byte(bus).wrapping_add(self.regs.y);
                (Operand::Memory(u16::from(zp)), false)
            }
            AddressingMode::Absolute => (Operand::Memory(self.fetch_word(bus)), false),
            AddressingMode::AbsoluteX => {
                let base = self.fetch_word(bus);
                indexed(base, self.regs.x)
            }
            AddressingMode::AbsoluteY => {
                let base = self.fetch_word(bus);
                indexed(base, self.regs.y)
            }
            AddressingMode::Indirect => {
                let ptr = self.fetch_word(bus);
                // The high byte is fetched without carrying into the pointer's page.
                let hi_ptr = (ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF);
                let lo = bus.read(ptr);
                let hi = bus.read(hi_ptr);
                (Operand::Memory(u16::from_le_bytes([lo, hi])), false)
            }
            AddressingMode::IndexedIndirect => {
                let zp = self.fetch_byte(bus).wrapping_add(self.regs.x);
                (Operand::Memory(read_zero_page_word(bus, zp)), false)
            }
            AddressingMode::IndirectIndexed => {
                let zp = self.fetch_byte(bus);
                let base = read_zero_page_word(bus, zp);
                indexed(base, self.regs.y)
            }
            AddressingMode::Relative => {
                let offset = self.fetch_byte(bus) as i8;
                (Operand::Relative(offset), false)
            }
        }
    }

    fn load<B: Bus>(&mut self, bus: &mut B, operand: Operand) -> u8 {
        match operand {
            Operand::Accumulator => self.regs.a,
            Operand::Memory(addr) => bus.read(addr),
            Operand::Relative(_) => 0,
        }
    }

    /// Write back a read-modify-write result to wherever the operand lives.
    fn store<B: Bus>(&mut self, bus: &mut B, operand: Operand, value: u8) {
        match operand {
            Operand::Accumulator => self.regs.a = value,
            Operand::Memory(addr) => bus.write(addr, value),
            Operand::Relative(_) => {}
        }
    }

    fn address(operand: Operand) -> u16 {
        match operand {
            Operand::Memory(addr) => addr,
            Operand::Accumulator | Operand::Relative(_) => 0,
        }
    }

    // === Execution ===

    /// Fetch, decode and execute one instruction, loading the cycle counter.
    fn execute<B: Bus>(&mut self, bus: &mut B) {
        self.opcode = self.fetch_byte(bus);
        let instruction = OPCODES[usize::from(self.opcode)];

        self.cycles = instruction.cycles;
        let (operand, page_crossed) = self.resolve(bus, instruction.mode);
        self.operate(bus, instruction.operation, operand);

        if page_crossed && instruction.operation.page_cross_penalty() {
            self.cycles += 1;
        }
    }

    fn operate<B: Bus>(&mut self, bus: &mut B, operation: Operation, operand: Operand) {
        match operation {
            // Loads and stores
            Operation::Lda => {
                self.regs.a = self.load(bus, operand);
                self.regs.p.update_nz(self.regs.a);
            }
            Operation::Ldx => {
                self.regs.x = self.load(bus, operand);
                self.regs.p.update_nz(self.regs.x);
            }
            Operation::Ldy => {
                self.regs.y = self.load(bus, operand);
                self.regs.p.update_nz(self.regs.y);
            }
            Operation::Sta => bus.write(Self::address(operand), self.regs.a),
            Operation::Stx => bus.write(Self::address(operand), self.regs.x),
            Operation::Sty => bus.write(Self::address(operand), self.regs.y),

            // Transfers
            Operation::Tax => {
                self.regs.x = self.regs.a;
                self.regs.p.update_nz(self.regs.x);
            }
            Operation::Tay => {
                self.regs.y = self.regs.a;
                self.regs.p.update_nz(self.regs.y);
            }
            Operation::Txa => {
                self.regs.a = self.regs.x;
                self.regs.p.update_nz(self.regs.a);
            }
            Operation::Tya => {
                self.regs.a = self.regs.y;
                self.regs.p.update_nz(self.regs.a);
            }
            Operation::Tsx => {
                self.regs.x = self.regs.s;
                self.regs.p.update_nz(self.regs.x);
            }
            Operation::Txs => self.regs.s = self.regs.x,

            // Stack
            Operation::Pha => self.push(bus, self.regs.a),
            Operation::Php => self.push(bus, self.regs.p.to_byte_brk()),
            Operation::Pla => {
                self.regs.a = self.pull(bus);
                self.regs.p.update_nz(self.regs.a);
            }
            Operation::Plp => {
                let value = self.pull(bus);
                self.regs.p = Status::from_stack(value);
            }

            // Arithmetic
            Operation::Adc => {
                let value = self.load(bus, operand);
                self.add_with_carry(value);
            }
            Operation::Sbc => {
                let value = self.load(bus, operand);
                self.add_with_carry(value ^ 0xFF);
            }
            Operation::Cmp => {
                let value = self.load(bus, operand);
                self.compare(self.regs.a, value);
            }
            Operation::Cpx => {
                let value = self.load(bus, operand);
                self.compare(self.regs.x, value);
            }
            Operation::Cpy => {
                let value = self.load(bus, operand);
                self.compare(self.regs.y, value);
            }

            // Logic
            Operation::And => {
                self.regs.a &= self.load(bus, operand);
                self.regs.p.update_nz(self.regs.a);
            }
            Operation::Ora => {
                self.regs.a |= self.load(bus, operand);
                self.regs.p.update_nz(self.regs.a);
            }
            Operation::Eor => {
                self.regs.a ^= self.load(bus, operand);
                self.regs.p.update_nz(self.regs.a);
            }
            Operation::Bit => {
                let value = self.load(bus, operand);
                self.regs.p.set_if(Z, self.regs.a & value == 0);
                self.regs.p.set_if(V, value & 0x40 != 0);
                self.regs.p.set_if(N, value & 0x80 != 0);
            }

            // Read-modify-write
            Operation::Asl => {
                let value = self.load(bus, operand);
                self.regs.p.set_if(C, value & 0x80 != 0);
                let result = value << 1;
                self.regs.p.update_nz(result);
                self.store(bus, operand, result);
            }
            Operation::Lsr => {
                let value = self.load(bus, operand);
                self.regs.p.set_if(C, value & 0x01 != 0);
                let result = value >> 1;
                self.regs.p.update_nz(result);
                self.store(bus, operand, result);
            }
            Operation::Rol => {
                let value = self.load(bus, operand);
                let carry_in = u8::from(self.regs.p.carry());
                self.regs.p.set_if(C, value & 0x80 != 0);
                let result = (value << 1) | carry_in;
                self.regs.p.update_nz(result);
                self.store(bus, operand, result);
            }
            Operation::Ror => {
                let value = self.load(bus, operand);
                let carry_in = if self.regs.p.carry() { 0x80 } else { 0 };
                self.regs.p.set_if(C, value & 0x01 != 0);
                let result = (value >> 1) | carry_in;
                self.regs.p.update_nz(result);
                self.store(bus, operand, result);
            }
            Operation::Inc => {
                let result = self.load(bus, operand).wrapping_add(1);
                self.regs.p.update_nz(result);
                self.store(bus, operand, result);
            }
            Operation::Dec => {
                let result = self.load(bus, operand).wrapping_sub(1);
                self.regs.p.update_nz(result);
                self.store(bus, operand, result);
            }
            Operation::Inx => {
                self.regs.x = self.regs.x.wrapping_add(1);
                self.regs.p.update_nz(self.regs.x);
            }
            Operation::Iny => {
                self.regs.y = self.regs.y.wrapping_add(1);
                self.regs.p.update_nz(self.regs.y);
            }
            Operation::Dex => {
                self.regs.x = self.regs.x.wrapping_sub(1);
                self.regs.p.update_nz(self.regs.x);
            }
            Operation::Dey => {
                self.regs.y = self.regs.y.wrapping_sub(1);
                self.regs.p.update_nz(self.regs.y);
            }

            // Branches
            Operation::Bcc => self.branch(operand, !self.regs.p.carry()),
            Operation::Bcs => self.branch(operand, self.regs.p.carry()),
            Operation::Bne => self.branch(operand, !self.regs.p.zero()),
            Operation::Beq => self.branch(operand, self.regs.p.zero()),
            Operation::Bpl => self.branch(operand, !self.regs.p.negative()),
            Operation::Bmi => self.branch(operand, self.regs.p.negative()),
            Operation::Bvc => self.branch(operand, !self.regs.p.overflow()),
            Operation::Bvs => self.branch(operand, self.regs.p.overflow()),

            // Jumps and interrupts
            Operation::Jmp => self.regs.pc = Self::address(operand),
            Operation::Jsr => {
                self.push_word(bus, self.regs.pc.wrapping_sub(1));
                self.regs.pc = Self::address(operand);
            }
            Operation::Rts => {
                self.regs.pc = self.pull_word(bus).wrapping_add(1);
            }
            Operation::Brk => {
                // Skip the padding byte after BRK.
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.push_word(bus, self.regs.pc);
                self.push(bus, self.regs.p.to_byte_brk());
                self.regs.p.set_interrupt_disable(true);
                self.regs.pc = bus.read_word(IRQ_VECTOR);
            }
            Operation::Rti => {
                let value = self.pull(bus);
                self.regs.p = Status::from_stack(value);
                self.regs.pc = self.pull_word(bus);
            }

            // Flags
            Operation::Clc => self.regs.p.set_if(C, false),
            Operation::Sec => self.regs.p.set_if(C, true),
            Operation::Cli => self.regs.p.set_if(I, false),
            Operation::Sei => self.regs.p.set_if(I, true),
            Operation::Cld => self.regs.p.set_if(D, false),
            Operation::Sed => self.regs.p.set_if(D, true),
            Operation::Clv => self.regs.p.set_if(V, false),

            Operation::Nop | Operation::Xxx => {}
        }
    }

    /// Binary ADC through a 9-bit sum. SBC feeds the operand's complement.
    fn add_with_carry(&mut self, value: u8) {
        let a = u16::from(self.regs.a);
        let m = u16::from(value);
        let sum = a + m + u16::from(self.regs.p.carry());

        self.regs.p.set_if(C, sum > 0xFF);
        self.regs.p.set_if(V, (!(a ^ m) & (a ^ sum)) & 0x0080 != 0);
        self.regs.a = sum as u8;
        self.regs.p.update_nz(self.regs.a);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.regs.p.set_if(C, register >= value);
        self.regs.p.update_nz(register.wrapping_sub(value));
    }

    /// Taken branches cost one cycle, plus one more when the target is on
    /// a different page from the next instruction.
    fn branch(&mut self, operand: Operand, condition: bool) {
        let Operand::Relative(offset) = operand else {
            return;
        };
        if !condition {
            return;
        }

        let target = self.regs.pc.wrapping_add_signed(i16::from(offset));
        self.cycles += 1;
        if target & 0xFF00 != self.regs.pc & 0xFF00 {
            self.cycles += 1;
        }
        self.regs.pc = target;
    }
}

/// Little-endian pointer read from page zero; the high byte wraps at $FF.
fn read_zero_page_word<B: Bus>(bus: &mut B, zp: u8) -> u16 {
    let lo = bus.read(u16::from(zp));
    let hi = bus.read(u16::from(zp.wrapping_add(1)));
    u16::from_le_bytes([lo, hi])
}

/// Add an index register to a 16-bit base, reporting a page cross.
fn indexed(base: u16, index: u8) -> (Operand, bool) {
    let addr = base.wrapping_add(u16::from(index));
    (Operand::Memory(addr), addr & 0xFF00 != base & 0xFF00)
}

impl Cpu for Mos6502 {
    type Registers = Registers;

    fn tick<B: Bus>(&mut self, bus: &mut B) {
        if self.cycles == 0 {
            self.execute(bus);
        }
        self.cycles = self.cycles.saturating_sub(1);
        self.total_cycles += 1;
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn registers(&self) -> Registers {
        self.regs
    }

    fn nmi<B: Bus>(&mut self, bus: &mut B) {
        self.push_word(bus, self.regs.pc);
        self.push(bus, self.regs.p.to_byte_irq());
        self.regs.p.set_interrupt_disable(true);
        self.regs.pc = bus.read_word(NMI_VECTOR);
        self.cycles = self.cycles.saturating_add(INTERRUPT_CYCLES);
    }

    fn reset<B: Bus>(&mut self, bus: &mut B) {
        self.regs = Registers::at_reset(bus.read_word(RESET_VECTOR));
        self.opcode = 0;
        self.cycles = INTERRUPT_CYCLES;
        self.total_cycles = 0;
        info!(pc = format_args!("${:04X}", self.regs.pc), "6502 reset");
    }
}

impl Observable for Mos6502 {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "pc" => Some(self.regs.pc.into()),
            "a" => Some(self.regs.a.into()),
            "x" => Some(self.regs.x.into()),
            "y" => Some(self.regs.y.into()),
            "s" | "sp" => Some(self.regs.s.into()),
            "p" | "status" => Some(self.regs.p.0.into()),
            "flags.c" => Some(self.regs.p.carry().into()),
            "flags.z" => Some(self.regs.p.zero().into()),
            "flags.i" => Some(self.regs.p.interrupt_disable().into()),
            "flags.d" => Some(self.regs.p.decimal().into()),
            "flags.v" => Some(self.regs.p.overflow().into()),
            "flags.n" => Some(self.regs.p.negative().into()),
            "opcode" => Some(self.opcode.into()),
            "cycles" => Some(self.cycles.into()),
            "total_cycles" => Some(self.total_cycles.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "pc", "a", "x", "y", "sp", "p", "flags.c", "flags.z", "flags.i", "flags.d",
            "flags.v", "flags.n", "opcode", "cycles", "total_cycles",
        ]
    }
}
