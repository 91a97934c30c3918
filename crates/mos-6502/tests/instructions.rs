//! Unit tests for 6502 instruction behavior.

use emu_core::{Bus, Cpu};
use mos_6502::{Mos6502, RESET_VECTOR, Status, flags};

/// Flat 64KB RAM bus for testing.
struct TestBus {
    ram: Vec<u8>,
}

impl TestBus {
    fn new() -> Self {
        Self {
            ram: vec![0; 0x10000],
        }
    }

    fn load(&mut self, addr: u16, bytes: &[u8]) {
        let start = usize::from(addr);
        self.ram[start..start + bytes.len()].copy_from_slice(bytes);
    }

    fn peek(&self, addr: u16) -> u8 {
        self.ram[usize::from(addr)]
    }
}

impl Bus for TestBus {
    fn read(&mut self, address: u16) -> u8 {
        self.ram[usize::from(address)]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.ram[usize::from(address)] = value;
    }
}

/// Run one complete instruction and return the cycles it took.
fn run_instruction(cpu: &mut Mos6502, bus: &mut TestBus) -> u32 {
    let mut cycles = 1;
    cpu.tick(bus);
    while !cpu.is_instruction_complete() {
        cpu.tick(bus);
        cycles += 1;
        assert!(cycles <= 16, "instruction did not complete");
    }
    cycles
}

/// Load a program at $0200 and set PC there.
fn setup_program(bus: &mut TestBus, cpu: &mut Mos6502, program: &[u8]) {
    bus.load(0x0200, program);
    cpu.regs.pc = 0x0200;
}

#[test]
fn test_stack_pha_pla() {
    let mut bus = TestBus::new();
    let mut cpu = Mos6502::new();

    let program = [
        0xA9, 0x42, // LDA #$42
        0xA2, 0xFF, // LDX #$FF
        0x9A, // TXS
        0x48, // PHA
        0xA9, 0x00, // LDA #$00
        0x68, // PLA
    ];
    setup_program(&mut bus, &mut cpu, &program);

    for _ in 0..6 {
        run_instruction(&mut cpu, &mut bus);
    }

    assert_eq!(cpu.regs.a, 0x42, "PLA should restore A");
    assert_eq!(cpu.regs.s, 0xFF, "SP should be back to $FF after PLA");
    assert!(!cpu.regs.p.zero());
}

#[test]
fn test_php_plp_keep_unused_and_drop_break() {
    let mut bus = TestBus::new();
    let mut cpu = Mos6502::new();

    let program = [
        0x38, // SEC
        0x08, // PHP
        0x18, // CLC
        0x28, // PLP
    ];
    setup_program(&mut bus, &mut cpu, &program);

    for _ in 0..2 {
        run_instruction(&mut cpu, &mut bus);
    }
    let pushed = bus.peek(0x01FD);
    assert_eq!(pushed & 0x30, 0x30, "PHP pushes B and U");

    for _ in 0..2 {
        run_instruction(&mut cpu, &mut bus);
    }
    assert!(cpu.regs.p.carry(), "PLP should restore carry");
    assert!(cpu.regs.p.unused());
    assert!(!cpu.regs.p.brk(), "B is not a real flag");
}

#[test]
fn test_txs_leaves_flags_alone() {
    let mut bus = TestBus::new();
    let mut cpu = Mos6502::new();

    // LDX #$00 sets Z; LDA #$80 clears Z, sets N; TXS must not disturb them.
    setup_program(&mut bus, &mut cpu, &[0xA2, 0x00, 0xA9, 0x80, 0x9A]);
    for _ in 0..3 {
        run_instruction(&mut cpu, &mut bus);
    }

    assert_eq!(cpu.regs.s, 0x00);
    assert!(!cpu.regs.p.zero());
    assert!(cpu.regs.p.negative());
}

#[test]
fn test_brk_stack_layout() {
    let mut bus = TestBus::new();
    let mut cpu = Mos6502::new();

    bus.write(0xFFFE, 0x00);
    bus.write(0xFFFF, 0x03);

    let program = [
        0xA2, 0xFF, // LDX #$FF    @ $0200
        0x9A, // TXS         @ $0202
        0x58, // CLI         @ $0203
        0x00, // BRK         @ $0204
        0xEA, // padding     @ $0205 (skipped)
    ];
    setup_program(&mut bus, &mut cpu, &program);

    for _ in 0..3 {
        run_instruction(&mut cpu, &mut bus);
    }
    assert_eq!(run_instruction(&mut cpu, &mut bus), 7);

    assert_eq!(cpu.pc(), 0x0300, "PC should be at BRK vector target");
    assert_eq!(cpu.regs.s, 0xFC, "three pushes from $FF");
    assert!(cpu.regs.p.interrupt_disable());

    // Return address skips the padding byte.
    assert_eq!(bus.peek(0x01FF), 0x02);
    assert_eq!(bus.peek(0x01FE), 0x06);

    let pushed_p = bus.peek(0x01FD);
    assert_eq!(pushed_p & 0x30, 0x30, "pushed P has B and U set");
    assert_eq!(pushed_p & 0x04, 0x00, "I was clear when BRK pushed");
    assert!(!cpu.regs.p.brk(), "B never sticks in the live register");
}

#[test]
fn test_brk_then_rti_returns_past_padding() {
    let mut bus = TestBus::new();
    let mut cpu = Mos6502::new();

    bus.write(0xFFFE, 0x00);
    bus.write(0xFFFF, 0x03);
    bus.load(0x0300, &[0x40]); // RTI
    setup_program(&mut bus, &mut cpu, &[0x00, 0xEA, 0xE8]); // BRK; pad; INX

    run_instruction(&mut cpu, &mut bus);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc(), 0x0202);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.x, 1);
}

#[test]
fn test_end_to_end_lda_adc_brk() {
    let mut bus = TestBus::new();
    let mut cpu = Mos6502::new();

    bus.load(0x8000, &[0xA9, 0x10, 0x69, 0x05, 0x00]);
    bus.write(RESET_VECTOR, 0x00);
    bus.write(RESET_VECTOR + 1, 0x80);
    cpu.reset(&mut bus);

    // Burn the reset cycles, then LDA, ADC, BRK.
    for _ in 0..8 {
        cpu.tick(&mut bus);
    }
    for _ in 0..3 {
        run_instruction(&mut cpu, &mut bus);
    }

    assert_eq!(cpu.regs.a, 0x15);
    let p = cpu.regs.p;
    assert!(!p.carry());
    assert!(!p.zero());
    assert!(!p.negative());
    assert!(!p.overflow());
    assert_eq!(bus.peek(0x01FD), 0x80, "BRK pushed PCH");
    assert_eq!(bus.peek(0x01FC), 0x06, "BRK pushed PCL");
}

#[test]
fn test_beq_cycles() {
    // BEQ +$20 at $80F0: target $8112 is on the next page.
    let program = [0xF0, 0x20];

    let mut bus = TestBus::new();
    bus.load(0x80F0, &program);

    let mut cpu = Mos6502::new();
    cpu.regs.pc = 0x80F0;
    cpu.regs.p.set_zero(true);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 4, "taken, page cross");
    assert_eq!(cpu.pc(), 0x8112);

    let mut cpu = Mos6502::new();
    cpu.regs.pc = 0x80F0;
    cpu.regs.p.set_zero(false);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 2, "not taken");
    assert_eq!(cpu.pc(), 0x80F2);

    // BEQ +$04 at $8000 stays on the page.
    bus.load(0x8000, &[0xF0, 0x04]);
    let mut cpu = Mos6502::new();
    cpu.regs.pc = 0x8000;
    cpu.regs.p.set_zero(true);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 3, "taken, same page");
    assert_eq!(cpu.pc(), 0x8006);
}

#[test]
fn test_backward_branch_across_page() {
    let mut bus = TestBus::new();
    // BNE -4 at $0300 lands at $02FE.
    bus.load(0x0300, &[0xD0, 0xFC]);
    let mut cpu = Mos6502::new();
    cpu.regs.pc = 0x0300;
    assert_eq!(run_instruction(&mut cpu, &mut bus), 4);
    assert_eq!(cpu.pc(), 0x02FE);
}

#[test]
fn test_adc_edge_cases() {
    let mut bus = TestBus::new();
    let mut cpu = Mos6502::new();

    // 0x50 + 0x50: signed overflow into negative, no carry.
    setup_program(&mut bus, &mut cpu, &[0xA9, 0x50, 0x69, 0x50]);
    run_instruction(&mut cpu, &mut bus);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a, 0xA0);
    assert!(cpu.regs.p.overflow());
    assert!(!cpu.regs.p.carry());
    assert!(cpu.regs.p.negative());

    // 0xFF + 0x01: wraps to zero with carry.
    let mut cpu = Mos6502::new();
    setup_program(&mut bus, &mut cpu, &[0xA9, 0xFF, 0x69, 0x01]);
    run_instruction(&mut cpu, &mut bus);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a, 0x00);
    assert!(cpu.regs.p.carry());
    assert!(cpu.regs.p.zero());
    assert!(!cpu.regs.p.overflow());
}

/// Execute a single immediate-mode `opcode` with the given A, operand and carry.
fn run_immediate(cpu: &mut Mos6502, bus: &mut TestBus, opcode: u8, a: u8, m: u8, carry: bool) {
    bus.load(0x0200, &[opcode, m]);
    cpu.regs.pc = 0x0200;
    cpu.regs.a = a;
    cpu.regs.p = Status::new();
    cpu.regs.p.set_carry(carry);
    run_instruction(cpu, bus);
}

#[test]
fn test_adc_exhaustive() {
    let mut bus = TestBus::new();
    let mut cpu = Mos6502::new();

    for a in 0..=255u8 {
        for m in 0..=255u8 {
            for carry in [false, true] {
                run_immediate(&mut cpu, &mut bus, 0x69, a, m, carry);

                let c = i16::from(carry);
                let unsigned = i16::from(a) + i16::from(m) + c;
                let signed = i16::from(a as i8) + i16::from(m as i8) + c;

                let ctx = format!("ADC {a:02X}+{m:02X}+{c}");
                assert_eq!(cpu.regs.a, unsigned as u8, "{ctx}");
                assert_eq!(cpu.regs.p.carry(), unsigned > 0xFF, "{ctx} C");
                assert_eq!(cpu.regs.p.zero(), unsigned as u8 == 0, "{ctx} Z");
                assert_eq!(cpu.regs.p.negative(), unsigned & 0x80 != 0, "{ctx} N");
                assert_eq!(cpu.regs.p.overflow(), !(-128..=127).contains(&signed), "{ctx} V");
            }
        }
    }
}

#[test]
fn test_sbc_exhaustive() {
    let mut bus = TestBus::new();
    let mut cpu = Mos6502::new();

    for a in 0..=255u8 {
        for m in 0..=255u8 {
            for carry in [false, true] {
                run_immediate(&mut cpu, &mut bus, 0xE9, a, m, carry);

                let borrow = i16::from(!carry);
                let unsigned = i16::from(a) - i16::from(m) - borrow;
                let signed = i16::from(a as i8) - i16::from(m as i8) - borrow;

                let ctx = format!("SBC {a:02X}-{m:02X}-{borrow}");
                assert_eq!(cpu.regs.a, unsigned as u8, "{ctx}");
                assert_eq!(cpu.regs.p.carry(), unsigned >= 0, "{ctx} C");
                assert_eq!(cpu.regs.p.zero(), unsigned as u8 == 0, "{ctx} Z");
                assert_eq!(cpu.regs.p.negative(), unsigned as u8 & 0x80 != 0, "{ctx} N");
                assert_eq!(cpu.regs.p.overflow(), !(-128..=127).contains(&signed), "{ctx} V");
            }
        }
    }
}

#[test]
fn test_page_cross_detection() {
    let mut bus = TestBus::new();

    for base in [0x1200u16, 0x12F0, 0x12FF, 0xFFF0] {
        for index in [0x00u8, 0x01, 0x0F, 0x10, 0xFF] {
            let crosses = (base.wrapping_add(u16::from(index)) & 0xFF00) != (base & 0xFF00);
            let [lo, hi] = base.to_le_bytes();

            // LDA abs,X (4), LDA abs,Y (4), LDA (zp),Y (5)
            for (program, base_cycles) in [
                (vec![0xBD, lo, hi], 4),
                (vec![0xB9, lo, hi], 4),
                (vec![0xB1, 0x40], 5),
            ] {
                bus.load(0x0040, &[lo, hi]);
                bus.load(0x0200, &program);
                let mut cpu = Mos6502::new();
                cpu.regs.pc = 0x0200;
                cpu.regs.x = index;
                cpu.regs.y = index;

                let cycles = run_instruction(&mut cpu, &mut bus);
                assert_eq!(
                    cycles,
                    base_cycles + u32::from(crosses),
                    "opcode {:02X} base ${base:04X} index {index:02X}",
                    program[0]
                );
            }
        }
    }
}

#[test]
fn test_store_never_pays_page_cross() {
    let mut bus = TestBus::new();
    let mut cpu = Mos6502::new();
    setup_program(&mut bus, &mut cpu, &[0x99, 0xFF, 0x12]); // STA $12FF,Y
    cpu.regs.y = 0x01;
    cpu.regs.a = 0x77;

    assert_eq!(run_instruction(&mut cpu, &mut bus), 5);
    assert_eq!(bus.peek(0x1300), 0x77);
}

#[test]
fn test_jmp_indirect_page_bug() {
    let mut bus = TestBus::new();
    let mut cpu = Mos6502::new();

    bus.write(0x10FF, 0x34);
    bus.write(0x1000, 0x12); // high byte comes from the start of the page
    bus.write(0x1100, 0x56); // not from the next page
    setup_program(&mut bus, &mut cpu, &[0x6C, 0xFF, 0x10]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 5);
    assert_eq!(cpu.pc(), 0x1234);
}

#[test]
fn test_zero_page_indexing_wraps() {
    let mut bus = TestBus::new();
    let mut cpu = Mos6502::new();

    bus.write(0x007F, 0xAA);
    bus.write(0x017F, 0xBB);
    setup_program(&mut bus, &mut cpu, &[0xB5, 0x80]); // LDA $80,X
    cpu.regs.x = 0xFF;
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a, 0xAA);
}

#[test]
fn test_indexed_indirect_pointer_wraps() {
    let mut bus = TestBus::new();
    let mut cpu = Mos6502::new();

    // ($FE,X) with X=1 reads the pointer from $FF and $00.
    bus.write(0x00FF, 0x00);
    bus.write(0x0000, 0x04);
    bus.write(0x0400, 0x5A);
    setup_program(&mut bus, &mut cpu, &[0xA1, 0xFE]);
    cpu.regs.x = 0x01;

    assert_eq!(run_instruction(&mut cpu, &mut bus), 6);
    assert_eq!(cpu.regs.a, 0x5A);
}

#[test]
fn test_shift_targets_follow_addressing_mode() {
    let mut bus = TestBus::new();
    let mut cpu = Mos6502::new();

    bus.write(0x0010, 0x81);
    setup_program(
        &mut bus,
        &mut cpu,
        &[
            0xA9, 0x40, // LDA #$40
            0x0A, // ASL A
            0x06, 0x10, // ASL $10
        ],
    );

    run_instruction(&mut cpu, &mut bus);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a, 0x80);
    assert_eq!(bus.peek(0x0010), 0x81, "ASL A leaves memory alone");

    assert_eq!(run_instruction(&mut cpu, &mut bus), 5);
    assert_eq!(bus.peek(0x0010), 0x02);
    assert_eq!(cpu.regs.a, 0x80, "ASL $10 leaves A alone");
    assert!(cpu.regs.p.carry());
}

#[test]
fn test_rotates_through_carry() {
    let mut bus = TestBus::new();
    let mut cpu = Mos6502::new();

    setup_program(
        &mut bus,
        &mut cpu,
        &[
            0x38, // SEC
            0xA9, 0x01, // LDA #$01
            0x6A, // ROR A -> $80, C=1
            0x2A, // ROL A -> $01, C=1
            0x4A, // LSR A -> $00, C=1
        ],
    );

    for _ in 0..3 {
        run_instruction(&mut cpu, &mut bus);
    }
    assert_eq!(cpu.regs.a, 0x80);
    assert!(cpu.regs.p.carry());

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a, 0x01);
    assert!(cpu.regs.p.carry());

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a, 0x00);
    assert!(cpu.regs.p.zero());
    assert!(cpu.regs.p.carry());
}

#[test]
fn test_inc_dec_memory() {
    let mut bus = TestBus::new();
    let mut cpu = Mos6502::new();

    bus.write(0x0300, 0xFF);
    setup_program(&mut bus, &mut cpu, &[0xEE, 0x00, 0x03, 0xCE, 0x00, 0x03]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 6);
    assert_eq!(bus.peek(0x0300), 0x00);
    assert!(cpu.regs.p.zero());

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(bus.peek(0x0300), 0xFF);
    assert!(cpu.regs.p.negative());
}

#[test]
fn test_jsr_rts_round_trip() {
    let mut bus = TestBus::new();
    let mut cpu = Mos6502::new();

    bus.load(0x0300, &[0xE8, 0x60]); // INX; RTS
    setup_program(&mut bus, &mut cpu, &[0x20, 0x00, 0x03, 0xC8]); // JSR $0300; INY

    assert_eq!(run_instruction(&mut cpu, &mut bus), 6);
    assert_eq!(cpu.pc(), 0x0300);
    assert_eq!(bus.peek(0x01FD), 0x02);
    assert_eq!(bus.peek(0x01FC), 0x02, "JSR pushes return address minus one");

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 6);
    assert_eq!(cpu.pc(), 0x0203);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!((cpu.regs.x, cpu.regs.y), (1, 1));
}

#[test]
fn test_compare_and_bit() {
    let mut bus = TestBus::new();
    let mut cpu = Mos6502::new();

    bus.write(0x0010, 0xC0);
    setup_program(
        &mut bus,
        &mut cpu,
        &[
            0xA9, 0x40, // LDA #$40
            0xC9, 0x40, // CMP #$40
            0x24, 0x10, // BIT $10
        ],
    );

    run_instruction(&mut cpu, &mut bus);
    run_instruction(&mut cpu, &mut bus);
    assert!(cpu.regs.p.zero() && cpu.regs.p.carry());

    run_instruction(&mut cpu, &mut bus);
    assert!(!cpu.regs.p.zero(), "A & M = $40");
    assert!(cpu.regs.p.negative());
    assert!(cpu.regs.p.overflow());
}

#[test]
fn test_undocumented_opcode_is_a_two_cycle_nop() {
    let mut bus = TestBus::new();
    let mut cpu = Mos6502::new();
    setup_program(&mut bus, &mut cpu, &[0x02, 0xE8]);
    let before = cpu.registers();

    assert_eq!(run_instruction(&mut cpu, &mut bus), 2);
    assert_eq!(cpu.pc(), 0x0201);
    assert_eq!(cpu.regs.a, before.a);
    assert_eq!(cpu.regs.p, before.p);
}

#[test]
fn test_flag_instructions() {
    let mut bus = TestBus::new();
    let mut cpu = Mos6502::new();
    setup_program(&mut bus, &mut cpu, &[0xF8, 0x78, 0xB8, 0xD8, 0x58]);
    cpu.regs.p.set_overflow(true);

    run_instruction(&mut cpu, &mut bus);
    assert!(cpu.regs.p.is_set(flags::D));
    run_instruction(&mut cpu, &mut bus);
    assert!(cpu.regs.p.is_set(flags::I));
    run_instruction(&mut cpu, &mut bus);
    assert!(!cpu.regs.p.is_set(flags::V));
    run_instruction(&mut cpu, &mut bus);
    assert!(!cpu.regs.p.is_set(flags::D));
    run_instruction(&mut cpu, &mut bus);
    assert!(!cpu.regs.p.is_set(flags::I));
}
