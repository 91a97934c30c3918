//! Opcode decode table.

use std::fmt;

/// How an instruction locates its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressingMode {
    /// No operand beyond the opcode. Reads of the operand see A.
    Implied,
    /// Operand is the accumulator (shift/rotate on A).
    Accumulator,
    /// Operand is the byte after the opcode.
    Immediate,
    /// `$nn`
    ZeroPage,
    /// `$nn,X`, wrapped to page zero.
    ZeroPageX,
    /// `$nn,Y`, wrapped to page zero.
    ZeroPageY,
    /// `$nnnn`
    Absolute,
    /// `$nnnn,X`
    AbsoluteX,
    /// `$nnnn,Y`
    AbsoluteY,
    /// `($nnnn)`, JMP only. The pointer's high byte never leaves its page.
    Indirect,
    /// `($nn,X)`
    IndexedIndirect,
    /// `($nn),Y`
    IndirectIndexed,
    /// Signed 8-bit branch offset.
    Relative,
}

impl AddressingMode {
    /// Operand bytes following the opcode.
    #[must_use]
    pub const fn operand_len(self) -> u8 {
        match self {
            Self::Implied | Self::Accumulator => 0,
            Self::Immediate
            | Self::ZeroPage
            | Self::ZeroPageX
            | Self::ZeroPageY
            | Self::IndexedIndirect
            | Self::IndirectIndexed
            | Self::Relative => 1,
            Self::Absolute | Self::AbsoluteX | Self::AbsoluteY | Self::Indirect => 2,
        }
    }

    /// True when the operand is the accumulator rather than memory.
    #[must_use]
    pub const fn targets_accumulator(self) -> bool {
        matches!(self, Self::Implied | Self::Accumulator)
    }
}

/// The semantic action of an instruction.
///
/// The 56 documented operations, plus [`Operation::Xxx`] for every opcode
/// the 6502 does not document. Those execute as no-ops.
#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi,
    Bne, Bpl, Brk, Bvc, Bvs, Clc, Cld, Cli,
    Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor,
    Inc, Inx, Iny, Jmp, Jsr, Lda, Ldx, Ldy,
    Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol,
    Ror, Rti, Rts, Sbc, Sec, Sed, Sei, Sta,
    Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
    /// Undocumented opcode.
    Xxx,
}

impl Operation {
    /// Assembler mnemonic. Undocumented opcodes show as `???`.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Adc => "ADC",
            Self::And => "AND",
            Self::Asl => "ASL",
            Self::Bcc => "BCC",
            Self::Bcs => "BCS",
            Self::Beq => "BEQ",
            Self::Bit => "BIT",
            Self::Bmi => "BMI",
            Self::Bne => "BNE",
            Self::Bpl => "BPL",
            Self::Brk => "BRK",
            Self::Bvc => "BVC",
            Self::Bvs => "BVS",
            Self::Clc => "CLC",
            Self::Cld => "CLD",
            Self::Cli => "CLI",
            Self::Clv => "CLV",
            Self::Cmp => "CMP",
            Self::Cpx => "CPX",
            Self::Cpy => "CPY",
            Self::Dec => "DEC",
            Self::Dex => "DEX",
            Self::Dey => "DEY",
            Self::Eor => "EOR",
            Self::Inc => "INC",
            Self::Inx => "INX",
            Self::Iny => "INY",
            Self::Jmp => "JMP",
            Self::Jsr => "JSR",
            Self::Lda => "LDA",
            Self::Ldx => "LDX",
            Self::Ldy => "LDY",
            Self::Lsr => "LSR",
            Self::Nop => "NOP",
            Self::Ora => "ORA",
            Self::Pha => "PHA",
            Self::Php => "PHP",
            Self::Pla => "PLA",
            Self::Plp => "PLP",
            Self::Rol => "ROL",
            Self::Ror => "ROR",
            Self::Rti => "RTI",
            Self::Rts => "RTS",
            Self::Sbc => "SBC",
            Self::Sec => "SEC",
            Self::Sed => "SED",
            Self::Sei => "SEI",
            Self::Sta => "STA",
            Self::Stx => "STX",
            Self::Sty => "STY",
            Self::Tax => "TAX",
            Self::Tay => "TAY",
            Self::Tsx => "TSX",
            Self::Txa => "TXA",
            Self::Txs => "TXS",
            Self::Tya => "TYA",
            Self::Xxx => "???",
        }
    }

    /// Whether this operation pays the extra cycle when its addressing mode
    /// crosses a page. Only the read-only ALU and load operations do.
    #[must_use]
    pub const fn page_cross_penalty(self) -> bool {
        matches!(
            self,
            Self::Adc
                | Self::And
                | Self::Cmp
                | Self::Eor
                | Self::Lda
                | Self::Ldx
                | Self::Ldy
                | Self::Ora
                | Self::Sbc
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// One decode-table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub operation: Operation,
    pub mode: AddressingMode,
    /// Base cycle count before page-cross and branch penalties.
    pub cycles: u8,
}

impl Instruction {
    #[must_use]
    pub const fn mnemonic(&self) -> &'static str {
        self.operation.mnemonic()
    }

    /// Opcode byte plus operand bytes.
    #[must_use]
    pub const fn byte_len(&self) -> u8 {
        1 + self.mode.operand_len()
    }

    #[must_use]
    pub const fn is_documented(&self) -> bool {
        !matches!(self.operation, Operation::Xxx)
    }
}

const fn i(operation: Operation, mode: AddressingMode, cycles: u8) -> Instruction {
    Instruction {
        operation,
        mode,
        cycles,
    }
}

const XXX: Instruction = i(Operation::Xxx, AddressingMode::Implied, 2);

/// Decode table indexed by opcode byte.
#[rustfmt::skip]
#[allow(clippy::enum_glob_use)]
pub static OPCODES: [Instruction; 256] = {
    use AddressingMode::{
        Absolute as ABS, AbsoluteX as ABX, AbsoluteY as ABY, Accumulator as ACC,
        Immediate as IMM, Implied as IMP, IndexedIndirect as IZX, Indirect as IND,
        IndirectIndexed as IZY, Relative as REL, ZeroPage as ZP0, ZeroPageX as ZPX,
        ZeroPageY as ZPY,
    };
    use Operation::*;
    const X: Instruction = XXX;

    [
        // 0x00
        i(Brk, IMP, 7), i(Ora, IZX, 6), X, X, X, i(Ora, ZP0, 3), i(Asl, ZP0, 5), X,
        i(Php, IMP, 3), i(Ora, IMM, 2), i(Asl, ACC, 2), X, X, i(Ora, ABS, 4), i(Asl, ABS, 6), X,
        // 0x10
        i(Bpl, REL, 2), i(Ora, IZY, 5), X, X, X, i(Ora, ZPX, 4), i(Asl, ZPX, 6), X,
        i(Clc, IMP, 2), i(Ora, ABY, 4), X, X, X, i(Ora, ABX, 4), i(Asl, ABX, 7), X,
        // 0x20
        i(Jsr, ABS, 6), i(And, IZX, 6), X, X, i(Bit, ZP0, 3), i(And, ZP0, 3), i(Rol, ZP0, 5), X,
        i(Plp, IMP, 4), i(And, IMM, 2), i(Rol, ACC, 2), X, i(Bit, ABS, 4), i(And, ABS, 4), i(Rol, ABS, 6), X,
        // 0x30
        i(Bmi, REL, 2), i(And, IZY, 5), X, X, X, i(And, ZPX, 4), i(Rol, ZPX, 6), X,
        i(Sec, IMP, 2), i(And, ABY, 4), X, X, X, i(And, ABX, 4), i(Rol, ABX, 7), X,
        // 0x40
        i(Rti, IMP, 6), i(Eor, IZX, 6), X, X, X, i(Eor, ZP0, 3), i(Lsr, ZP0, 5), X,
        i(Pha, IMP, 3), i(Eor, IMM, 2), i(Lsr, ACC, 2), X, i(Jmp, ABS, 3), i(Eor, ABS, 4), i(Lsr, ABS, 6), X,
        // 0x50
        i(Bvc, REL, 2), i(Eor, IZY, 5), X, X, X, i(Eor, ZPX, 4), i(Lsr, ZPX, 6), X,
        i(Cli, IMP, 2), i(Eor, ABY, 4), X, X, X, i(Eor, ABX, 4), i(Lsr, ABX, 7), X,
        // 0x60
        i(Rts, IMP, 6), i(Adc, IZX, 6), X, X, X, i(Adc, ZP0, 3), i(Ror, ZP0, 5), X,
        i(Pla, IMP, 4), i(Adc, IMM, 2), i(Ror, ACC, 2), X, i(Jmp, IND, 5), i(Adc, ABS, 4), i(Ror, ABS, 6), X,
        // 0x70
        i(Bvs, REL, 2), i(Adc, IZY, 5), X, X, X, i(Adc, ZPX, 4), i(Ror, ZPX, 6), X,
        i(Sei, IMP, 2), i(Adc, ABY, 4), X, X, X, i(Adc, ABX, 4), i(Ror, ABX, 7), X,
        // 0x80
        X, i(Sta, IZX, 6), X, X, i(Sty, ZP0, 3), i(Sta, ZP0, 3), i(Stx, ZP0, 3), X,
        i(Dey, IMP, 2), X, i(Txa, IMP, 2), X, i(Sty, ABS, 4), i(Sta, ABS, 4), i(Stx, ABS, 4), X,
        // 0x90
        i(Bcc, REL, 2), i(Sta, IZY, 6), X, X, i(Sty, ZPX, 4), i(Sta, ZPX, 4), i(Stx, ZPY, 4), X,
        i(Tya, IMP, 2), i(Sta, ABY, 5), i(Txs, IMP, 2), X, X, i(Sta, ABX, 5), X, X,
        // 0xA0
        i(Ldy, IMM, 2), i(Lda, IZX, 6), i(Ldx, IMM, 2), X, i(Ldy, ZP0, 3), i(Lda, ZP0, 3), i(Ldx, ZP0, 3), X,
        i(Tay, IMP, 2), i(Lda, IMM, 2), i(Tax, IMP, 2), X, i(Ldy, ABS, 4), i(Lda, ABS, 4), i(Ldx, ABS, 4), X,
        // 0xB0
        i(Bcs, REL, 2), i(Lda, IZY, 5), X, X, i(Ldy, ZPX, 4), i(Lda, ZPX, 4), i(Ldx, ZPY, 4), X,
        i(Clv, IMP, 2), i(Lda, ABY, 4), i(Tsx, IMP, 2), X, i(Ldy, ABX, 4), i(Lda, ABX, 4), i(Ldx, ABY, 4), X,
        // 0xC0
        i(Cpy, IMM, 2), i(Cmp, IZX, 6), X, X, i(Cpy, ZP0, 3), i(Cmp, ZP0, 3), i(Dec, ZP0, 5), X,
        i(Iny, IMP, 2), i(Cmp, IMM, 2), i(Dex, IMP, 2), X, i(Cpy, ABS, 4), i(Cmp, ABS, 4), i(Dec, ABS, 6), X,
        // 0xD0
        i(Bne, REL, 2), i(Cmp, IZY, 5), X, X, X, i(Cmp, ZPX, 4), i(Dec, ZPX, 6), X,
        i(Cld, IMP, 2), i(Cmp, ABY, 4), X, X, X, i(Cmp, ABX, 4), i(Dec, ABX, 7), X,
        // 0xE0
        i(Cpx, IMM, 2), i(Sbc, IZX, 6), X, X, i(Cpx, ZP0, 3), i(Sbc, ZP0, 3), i(Inc, ZP0, 5), X,
        i(Inx, IMP, 2), i(Sbc, IMM, 2), i(Nop, IMP, 2), X, i(Cpx, ABS, 4), i(Sbc, ABS, 4), i(Inc, ABS, 6), X,
        // 0xF0
        i(Beq, REL, 2), i(Sbc, IZY, 5), X, X, X, i(Sbc, ZPX, 4), i(Inc, ZPX, 6), X,
        i(Sed, IMP, 2), i(Sbc, ABY, 4), X, X, X, i(Sbc, ABX, 4), i(Inc, ABX, 7), X,
    ]
};
