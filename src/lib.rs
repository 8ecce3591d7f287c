// Machine model
mod memory;
pub use memory::{Flag, Memory, Registers, MEMORY_SIZE, SP, STACK_START};
mod alu;
pub use alu::AluOp;
pub mod isa;
pub use isa::{Instruction, Opcode};

// Running
mod runtime;
pub use runtime::{Error, Fault, Machine, Space, Status};
pub mod image;
pub use image::LoadError;

// Reporting
pub mod error;
pub mod output;
mod span;
pub use span::{Idx, Span};

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 2;
