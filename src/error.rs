use miette::{miette, LabeledSpan, Report, Severity};

use crate::image::LoadError;
use crate::runtime::{self, Fault};

// Loader errors

pub fn load(err: LoadError) -> Report {
    match err {
        LoadError::NotFound { .. } => miette!(
            severity = Severity::Error,
            code = "load::not_found",
            help = "check the path to the program image",
            "{err}",
        ),
        LoadError::Io { .. } => miette!(
            severity = Severity::Error,
            code = "load::io",
            help = "make sure the program image is a readable text file",
            "{err}",
        ),
        LoadError::Malformed { span, ref text, .. } => {
            let text = text.clone();
            miette!(
                severity = Severity::Error,
                code = "load::malformed",
                help = "significant lines hold up to 8 binary digits, like 10000010",
                labels = vec![LabeledSpan::at(span, "not a binary literal")],
                "{err}",
            )
            .with_source_code(text)
        }
        LoadError::TooLarge { .. } => miette!(
            severity = Severity::Error,
            code = "load::too_large",
            help = "the whole program, including data, must fit in 256 bytes",
            "{err}",
        ),
    }
}

// Runtime errors

pub fn runtime(err: &runtime::Error) -> Report {
    let (code, help) = match err.fault {
        Fault::OutOfBounds { .. } => (
            "run::out_of_bounds",
            "check register operands are 0-7 and jumps stay inside the program",
        ),
        Fault::StackOverflow => (
            "run::stack_overflow",
            "the stack grew past address 0; check for unbalanced PUSH or CALL",
        ),
        Fault::DivisionByZero => (
            "run::div_by_zero",
            "compare the divisor against zero before DIV",
        ),
        Fault::UnknownOpcode { .. } => (
            "run::unknown_opcode",
            "the PC may have landed on data or an operand byte",
        ),
        Fault::UnsupportedOperation { .. } => (
            "run::unsupported_op",
            "ALU operations are ADD, SUB, MUL, DIV and CMP",
        ),
        Fault::CycleLimit { .. } => (
            "run::cycle_limit",
            "raise `--max-cycles` or check the program for an endless loop",
        ),
        Fault::Output(_) => ("run::output", "is standard output closed?"),
    };
    let opcode = match err.opcode {
        Some(opcode) => format!("{opcode:#010b}"),
        None => "none".to_owned(),
    };
    miette!(
        severity = Severity::Error,
        code = code,
        help = help,
        "{err} (opcode {opcode})",
    )
}
