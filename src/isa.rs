//! LS-8 instruction encoding.
//!
//! Every opcode byte carries its own decoding metadata:
//!
//! ```text
//!   7 6    5     4     3 2 1 0
//! [ AA ] [ALU] [ PC ] [  ID   ]
//! ```
//!
//! `AA` is the number of operand bytes following the opcode, `ALU` routes the
//! instruction through the arithmetic-logic unit and `PC` marks instructions
//! that set the program counter themselves.

use std::fmt;

use crate::alu::AluOp;
use crate::memory::Memory;
use crate::runtime::Fault;

pub const HLT: u8 = 0b0000_0001;
pub const LDI: u8 = 0b1000_0010;
pub const PRN: u8 = 0b0100_0111;
pub const PUSH: u8 = 0b0100_0101;
pub const POP: u8 = 0b0100_0110;
pub const CALL: u8 = 0b0101_0000;
pub const RET: u8 = 0b0001_0001;
pub const JMP: u8 = 0b0101_0100;
pub const JEQ: u8 = 0b0101_0101;
pub const JNE: u8 = 0b0101_0110;

/// Number of operand bytes which follow `byte` in memory.
#[inline]
pub const fn operand_count(byte: u8) -> u8 {
    byte >> 6
}

#[inline]
pub const fn is_alu(byte: u8) -> bool {
    (byte >> 5) & 1 == 1
}

/// Instruction moves the PC itself, so the loop must not advance it.
#[inline]
pub const fn sets_pc(byte: u8) -> bool {
    (byte >> 4) & 1 == 1
}

/// Every instruction the machine understands.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Opcode {
    Hlt,
    Ldi,
    Prn,
    Push,
    Pop,
    Call,
    Ret,
    Jmp,
    Jeq,
    Jne,
    Alu(AluOp),
}

impl Opcode {
    /// Route an opcode byte to either the ALU or a handler.
    pub fn decode(byte: u8) -> Result<Opcode, Fault> {
        if is_alu(byte) {
            return AluOp::decode(byte)
                .map(Opcode::Alu)
                .ok_or(Fault::UnsupportedOperation { opcode: byte });
        }
        match byte {
            HLT => Ok(Opcode::Hlt),
            LDI => Ok(Opcode::Ldi),
            PRN => Ok(Opcode::Prn),
            PUSH => Ok(Opcode::Push),
            POP => Ok(Opcode::Pop),
            CALL => Ok(Opcode::Call),
            RET => Ok(Opcode::Ret),
            JMP => Ok(Opcode::Jmp),
            JEQ => Ok(Opcode::Jeq),
            JNE => Ok(Opcode::Jne),
            _ => Err(Fault::UnknownOpcode { opcode: byte }),
        }
    }

    pub fn encode(self) -> u8 {
        match self {
            Opcode::Hlt => HLT,
            Opcode::Ldi => LDI,
            Opcode::Prn => PRN,
            Opcode::Push => PUSH,
            Opcode::Pop => POP,
            Opcode::Call => CALL,
            Opcode::Ret => RET,
            Opcode::Jmp => JMP,
            Opcode::Jeq => JEQ,
            Opcode::Jne => JNE,
            Opcode::Alu(op) => op.encode(),
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Hlt => "HLT",
            Opcode::Ldi => "LDI",
            Opcode::Prn => "PRN",
            Opcode::Push => "PUSH",
            Opcode::Pop => "POP",
            Opcode::Call => "CALL",
            Opcode::Ret => "RET",
            Opcode::Jmp => "JMP",
            Opcode::Jeq => "JEQ",
            Opcode::Jne => "JNE",
            Opcode::Alu(op) => op.mnemonic(),
        }
    }
}

/// A decoded opcode together with the operand bytes fetched after it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Instruction {
    pub opcode: Opcode,
    /// Bytes at PC+1 and PC+2, fetched whether or not the opcode uses them.
    pub operands: [u8; 2],
}

impl Instruction {
    /// Fetch the instruction at `addr` with a fixed-width, three byte read.
    ///
    /// Both operand bytes must lie in memory, so an instruction in the last
    /// two bytes faults before it is decoded.
    pub fn fetch(mem: &Memory, addr: u16) -> Result<Instruction, Fault> {
        let byte = mem.read(addr)?;
        let operands = [mem.read(addr + 1)?, mem.read(addr + 2)?];
        let opcode = Opcode::decode(byte)?;
        Ok(Instruction { opcode, operands })
    }

    /// Bytes occupied by opcode and operands.
    pub fn width(&self) -> u16 {
        operand_count(self.opcode.encode()) as u16 + 1
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b] = self.operands;
        let name = self.opcode.mnemonic();
        match self.opcode {
            Opcode::Hlt | Opcode::Ret => write!(f, "{name}"),
            Opcode::Ldi => write!(f, "{name} R{a}, {b}"),
            Opcode::Alu(_) => write!(f, "{name} R{a}, R{b}"),
            _ => write!(f, "{name} R{a}"),
        }
    }
}
