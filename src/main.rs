use std::io;
use std::path::PathBuf;

use clap::builder::FalseyValueParser;
use clap::Parser;
use colored::Colorize;

use ls8::output::Output;
use ls8::Machine;

/// Run an LS-8 program image.
///
/// Images hold one 8-bit binary literal per line; `#` starts a comment.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// `.ls8` program image to run
    path: PathBuf,
    /// Produce minimal output, suited for blackbox tests
    #[arg(short, long)]
    minimal: bool,
    /// Print machine state before every instruction
    #[arg(short, long, env = "LS8_TRACE", value_parser = FalseyValueParser::new())]
    trace: bool,
    /// Print registers and flags once the program stops
    #[arg(short, long)]
    dump: bool,
    /// Give up after executing this many instructions
    #[arg(long, value_name = "N")]
    max_cycles: Option<u64>,
}

fn main() -> miette::Result<()> {
    use MsgColor::*;
    let args = Args::parse();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(ls8::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;
    Output::set_minimal(args.minimal);

    file_message(Green, "Loading", &args.path);
    let mut machine = Machine::new();
    machine.load(&args.path).map_err(ls8::error::load)?;
    machine.set_trace(args.trace);
    machine.set_cycle_limit(args.max_cycles);

    message(Green, "Running", "program image");
    let result = machine.run(&mut io::stdout().lock());

    if args.dump {
        Output::Diagnostic.print_registers(&machine);
    }
    match result {
        Ok(()) => {
            let summary = format!("after {} instructions", machine.cycles());
            message(Cyan, "Halted", &summary);
            Ok(())
        }
        Err(err) => {
            message(Red, "Faulted", "machine stopped");
            Err(ls8::error::runtime(&err))
        }
    }
}

enum MsgColor {
    Green,
    Cyan,
    Red,
}

fn file_message(color: MsgColor, left: &str, right: &PathBuf) {
    let right = format!("target {}", right.display());
    message(color, left, &right);
}

fn message(color: MsgColor, left: &str, right: &str) {
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    Output::Status.print_str(&format!("{left:>12} {right}\n"));
}
