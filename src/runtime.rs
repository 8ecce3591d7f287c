use std::error;
use std::fmt;
use std::io::{self, Write};
use std::path::Path;

use crate::alu;
use crate::image::{self, LoadError};
use crate::isa::{self, Instruction, Opcode};
use crate::memory::{Flag, Memory, Registers, MEMORY_SIZE, SP};
use crate::output::Output;

/// Address space a faulting access was made in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Space {
    Memory,
    Register,
}

/// Condition which stops the machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    OutOfBounds { space: Space, address: u16 },
    /// Push with the stack pointer already at address 0.
    StackOverflow,
    DivisionByZero,
    UnknownOpcode { opcode: u8 },
    /// ALU bit set on a byte which is not an ALU operation.
    UnsupportedOperation { opcode: u8 },
    CycleLimit { limit: u64 },
    /// `PRN` could not write to its output.
    Output(io::ErrorKind),
}

impl error::Error for Fault {}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { space, address } => {
                let (name, max) = match space {
                    Space::Memory => ("memory address", MEMORY_SIZE - 1),
                    Space::Register => ("register", crate::memory::REGISTER_COUNT - 1),
                };
                write!(f, "Out of bounds {name} {address:#04x} (max {max:#04x})")
            }
            Self::StackOverflow => write!(f, "Stack overflow"),
            Self::DivisionByZero => write!(f, "Division by zero"),
            Self::UnknownOpcode { opcode } => write!(f, "Unknown opcode {opcode:#010b}"),
            Self::UnsupportedOperation { opcode } => {
                write!(f, "Unsupported ALU operation {opcode:#010b}")
            }
            Self::CycleLimit { limit } => write!(f, "Cycle limit of {limit} reached"),
            Self::Output(kind) => write!(f, "Failed to write output: {kind}"),
        }
    }
}

/// A fault together with where it happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Error {
    pub fault: Fault,
    pub pc: u16,
    /// `None` if the PC itself was out of bounds.
    pub opcode: Option<u8>,
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at pc {:#04x}", self.fault, self.pc)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Running,
    Halted,
}

/// Complete machine state during runtime.
pub struct Machine {
    /// System memory - 256 bytes, holding both program and stack
    mem: Memory,
    /// Program counter, wide enough to step past the end of memory
    pc: u16,
    /// 8x 8-bit registers, R7 is the stack pointer
    reg: Registers,
    /// Result of the last compare
    flag: Flag,
    status: Status,
    cycles: u64,
    cycle_limit: Option<u64>,
    trace: bool,
}

impl Machine {
    pub fn new() -> Self {
        Machine {
            mem: Memory::new(),
            pc: 0,
            reg: Registers::new(),
            flag: Flag::Uninit,
            status: Status::Running,
            cycles: 0,
            cycle_limit: None,
            trace: false,
        }
    }

    /// Load a program image from disk into memory, starting at address 0.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        let program = image::read(path.as_ref())?;
        self.load_bytes(&program)
    }

    /// Replace memory with `program`, zero-filling everything after it.
    pub fn load_bytes(&mut self, program: &[u8]) -> Result<(), LoadError> {
        if program.len() > MEMORY_SIZE {
            return Err(LoadError::TooLarge { len: program.len() });
        }
        self.mem = Memory::new();
        for (addr, byte) in program.iter().enumerate() {
            self.mem
                .write(addr as u16, *byte)
                .map_err(|_| LoadError::TooLarge { len: program.len() })?;
        }
        Ok(())
    }

    pub fn set_cycle_limit(&mut self, limit: Option<u64>) {
        self.cycle_limit = limit;
    }

    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    /// Run until `HLT` or the first fault.
    ///
    /// Output written before a fault is left in `out`.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<(), Error> {
        while self.step(out)? == Status::Running {}
        Ok(())
    }

    /// Perform a single fetch-decode-execute cycle.
    pub fn step<W: Write>(&mut self, out: &mut W) -> Result<Status, Error> {
        if self.status == Status::Halted {
            return Ok(Status::Halted);
        }
        let pc = self.pc;
        match self.cycle(out) {
            Ok(status) => {
                self.status = status;
                Ok(status)
            }
            Err(fault) => {
                self.status = Status::Halted;
                Err(Error {
                    fault,
                    pc,
                    opcode: self.mem.get(pc),
                })
            }
        }
    }

    fn cycle<W: Write>(&mut self, out: &mut W) -> Result<Status, Fault> {
        if let Some(limit) = self.cycle_limit {
            if self.cycles >= limit {
                return Err(Fault::CycleLimit { limit });
            }
        }
        if self.trace {
            Output::Diagnostic.print_trace(self);
        }

        let instr = Instruction::fetch(&self.mem, self.pc)?;
        self.cycles += 1;

        if self.execute(instr, out)? == Status::Halted {
            return Ok(Status::Halted);
        }
        if !isa::sets_pc(instr.opcode.encode()) {
            self.pc += instr.width();
        }
        Ok(Status::Running)
    }

    fn execute<W: Write>(&mut self, instr: Instruction, out: &mut W) -> Result<Status, Fault> {
        let [a, b] = instr.operands;
        match instr.opcode {
            Opcode::Hlt => return Ok(Status::Halted),
            Opcode::Ldi => self.reg.set(a, b)?,
            Opcode::Prn => {
                let val = self.reg.get(a)?;
                writeln!(out, "{val}").map_err(|e| Fault::Output(e.kind()))?;
            }
            Opcode::Push => {
                let sp = self.below_sp()?;
                let val = self.reg_at_sp(a, sp)?;
                self.reg.set_sp(sp);
                self.mem.write(sp as u16, val)?;
            }
            Opcode::Pop => {
                let val = self.mem.read(self.reg.sp() as u16)?;
                // R7 receives the popped value before it is incremented
                let base = if a == SP { val } else { self.reg.sp() };
                let next = Self::above(base)?;
                self.reg.set(a, val)?;
                self.reg.set_sp(next);
            }
            Opcode::Call => {
                let ret = self.pc + instr.width();
                let ret = u8::try_from(ret).map_err(|_| Fault::OutOfBounds {
                    space: Space::Memory,
                    address: ret,
                })?;
                let sp = self.below_sp()?;
                let target = self.reg_at_sp(a, sp)?;
                self.reg.set_sp(sp);
                self.mem.write(sp as u16, ret)?;
                self.pc = target as u16;
            }
            Opcode::Ret => self.pc = self.pop_val()? as u16,
            Opcode::Jmp => self.pc = self.reg.get(a)? as u16,
            Opcode::Jeq => self.jump_if(self.flag.is_equal(), a, instr)?,
            Opcode::Jne => self.jump_if(!self.flag.is_equal(), a, instr)?,
            Opcode::Alu(op) => alu::execute(op, &mut self.reg, &mut self.flag, a, b)?,
        }
        Ok(Status::Running)
    }

    /// Conditional jumps carry the PC bit, so fall-through must skip the operand here.
    fn jump_if(&mut self, cond: bool, reg: u8, instr: Instruction) -> Result<(), Fault> {
        if cond {
            self.pc = self.reg.get(reg)? as u16;
        } else {
            self.pc += instr.width();
        }
        Ok(())
    }

    // Stack handlers check every operand before committing, so a faulting
    // instruction leaves no partial effect behind.

    /// Slot the next push writes to.
    fn below_sp(&self) -> Result<u8, Fault> {
        self.reg.sp().checked_sub(1).ok_or(Fault::StackOverflow)
    }

    /// Stack pointer after popping from `sp`.
    fn above(sp: u8) -> Result<u8, Fault> {
        sp.checked_add(1).ok_or(Fault::OutOfBounds {
            space: Space::Memory,
            address: sp as u16 + 1,
        })
    }

    /// Read register `index` as if the stack pointer already held `sp`.
    fn reg_at_sp(&self, index: u8, sp: u8) -> Result<u8, Fault> {
        if index == SP {
            Ok(sp)
        } else {
            self.reg.get(index)
        }
    }

    fn pop_val(&mut self) -> Result<u8, Fault> {
        let sp = self.reg.sp();
        let val = self.mem.read(sp as u16)?;
        self.reg.set_sp(Self::above(sp)?);
        Ok(val)
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn reg(&self, index: u8) -> Result<u8, Fault> {
        self.reg.get(index)
    }

    pub fn registers(&self) -> &Registers {
        &self.reg
    }

    pub fn sp(&self) -> u8 {
        self.reg.sp()
    }

    pub fn flag(&self) -> Flag {
        self.flag
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    /// Instructions executed so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}
