use std::cell::RefCell;
use std::str::Chars;

use colored::Colorize;

use crate::isa::Instruction;
use crate::memory::REGISTER_COUNT;
use crate::runtime::Machine;

/// Everything the emulator prints besides program output.
///
/// Both channels write to stderr, leaving stdout to `PRN`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Output {
    /// Progress messages, silenced by `--minimal`.
    Status,
    /// Traces and register dumps, uncoloured by `--minimal`.
    Diagnostic,
}

struct Decolored<'a> {
    chars: Chars<'a>,
}

impl Output {
    thread_local! {
        static IS_MINIMAL: RefCell<bool> = const { RefCell::new(false) };
    }

    pub fn set_minimal(new_value: bool) -> bool {
        Self::IS_MINIMAL.with(|value| value.replace(new_value))
    }
    pub fn is_minimal() -> bool {
        Self::IS_MINIMAL.with(|value| *value.borrow())
    }

    pub fn print_str(&self, string: &str) {
        match (self, Self::is_minimal()) {
            (Self::Status, true) => (),
            (Self::Status, false) => eprint!("{}", string),
            (Self::Diagnostic, false) => eprint!("{}", string.blue()),
            (Self::Diagnostic, true) => eprint_colorless(string),
        }
    }

    pub fn print_trace(&self, machine: &Machine) {
        self.print_str(&trace_line(machine));
        self.print_str("\n");
    }

    pub fn print_registers(&self, machine: &Machine) {
        let reg = machine.registers().as_slice();
        if Self::is_minimal() {
            for (i, val) in reg.iter().enumerate() {
                self.print_str(&format!("R{} {}\n", i, val));
            }
            self.print_str(&format!("PC {}\n", machine.pc()));
            self.print_str(&format!("FL {:03b}\n", machine.flag().bits()));
            return;
        }

        self.print_str("\x1b[2m┌──────────────────────────┐\x1b[0m\n");
        self.print_str("\x1b[2m│       \x1b[3mhex   uint   bin\x1b[0m\x1b[2m  │\x1b[0m\n");
        for (i, val) in reg.iter().enumerate() {
            let name = if i == REGISTER_COUNT - 1 { "SP" } else { "  " };
            self.print_str("\x1b[2m│\x1b[0m");
            self.print_str(&format!(" \x1b[1mR{}\x1b[0m{}", i, name));
            self.print_str(&format!(" 0x{:02x}  {:>4}  {:08b}", val, val, val));
            self.print_str(" \x1b[2m│\x1b[0m\n");
        }
        self.print_str("\x1b[2m│\x1b[0m");
        self.print_str(&format!(" \x1b[1mPC\x1b[0m   0x{:02x}", machine.pc()));
        self.print_str(&format!("  \x1b[1mFL\x1b[0m  {:03b}     ", machine.flag().bits()));
        self.print_str(" \x1b[2m│\x1b[0m\n");
        self.print_str("\x1b[2m└──────────────────────────┘\x1b[0m\n");
    }
}

/// `TRACE: PC | IR OP1 OP2 | R0 .. R7` followed by the disassembled instruction.
///
/// Bytes past the end of memory show as `--`, and an instruction which cannot
/// be fetched is not disassembled.
pub fn trace_line(machine: &Machine) -> String {
    let pc = machine.pc();
    let mem = machine.memory();
    let byte = |addr: u16| match mem.get(addr) {
        Some(val) => format!("{:02X}", val),
        None => "--".to_owned(),
    };
    let mut line = format!(
        "TRACE: {:02X} | {} {} {} |",
        pc,
        byte(pc),
        byte(pc + 1),
        byte(pc + 2)
    );
    for val in machine.registers().as_slice() {
        line.push_str(&format!(" {:02X}", val));
    }
    if let Ok(instr) = Instruction::fetch(mem, pc) {
        line.push_str(&format!("  {}", instr));
    }
    line
}

impl<'a> Decolored<'a> {
    pub fn new(string: &'a str) -> Self {
        Self {
            chars: string.chars(),
        }
    }
}

impl<'a> Iterator for Decolored<'a> {
    type Item = char;
    fn next(&mut self) -> Option<Self::Item> {
        while let Some(ch) = self.chars.next() {
            // Skip everything between '\x1b' and 'm' (inclusive)
            if ch == '\x1b' {
                while self.chars.next().is_some_and(|ch| ch != 'm') {}
                continue;
            }
            return Some(ch);
        }
        None
    }
}

fn eprint_colorless(string: &str) {
    let string: String = Decolored::new(string).collect();
    eprint!("{}", string);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::{HLT, LDI};

    #[test]
    fn decolored() {
        assert_eq!(Decolored::new("abcdef").collect::<String>(), "abcdef");
        assert_eq!(
            Decolored::new("abc\x1b[0;2mdef\x1b[0m").collect::<String>(),
            "abcdef"
        );
        assert_eq!(Decolored::new("abc\x1b[0xyz").collect::<String>(), "abc");
        assert_eq!(
            Decolored::new("abc\x1bw[0bxyzmdef").collect::<String>(),
            "abcdef"
        );
    }

    #[test]
    fn trace_format() {
        let mut machine = Machine::new();
        machine.load_bytes(&[LDI, 0, 8, HLT]).unwrap();
        assert_eq!(
            trace_line(&machine),
            "TRACE: 00 | 82 00 08 | 00 00 00 00 00 00 00 F4  LDI R0, 8"
        );

        machine.step(&mut Vec::new()).unwrap();
        assert_eq!(
            trace_line(&machine),
            "TRACE: 03 | 01 00 00 | 08 00 00 00 00 00 00 F4  HLT"
        );
    }

    #[test]
    fn trace_at_end_of_memory() {
        let mut program = [0u8; 256];
        program[0] = LDI;
        program[1] = 7;
        program[2] = 0xFF;
        program[3] = crate::isa::JMP;
        program[4] = 7;
        program[255] = HLT;
        let mut machine = Machine::new();
        machine.load_bytes(&program).unwrap();
        machine.step(&mut Vec::new()).unwrap();
        machine.step(&mut Vec::new()).unwrap();
        assert_eq!(
            trace_line(&machine),
            "TRACE: FF | 01 -- -- | 00 00 00 00 00 00 00 FF"
        );
        // The fetch itself faults, after the trace line is printed
        assert!(machine.step(&mut Vec::new()).is_err());
    }

    #[test]
    fn unknown_opcode_has_no_disassembly() {
        let machine = Machine::new();
        assert_eq!(
            trace_line(&machine),
            "TRACE: 00 | 00 00 00 | 00 00 00 00 00 00 00 F4"
        );
    }
}
