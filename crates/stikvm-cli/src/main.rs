//! `stikvm` — the command-line entry point for the interpreter: load a `.stk`
//! container, run it to completion, and map the result to a process exit code.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use stikvm_core::Panic;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Register-based bytecode VM. Exit code is the VM's panic code: 0 on a clean
/// HALT (or RET off the entry frame), the panic's numeric code otherwise.
#[derive(Parser)]
#[command(name = "stikvm", version, about, long_about = None)]
struct Cli {
    /// Path to the `.stk` container to load and run.
    file: PathBuf,

    /// Install a tracing subscriber and log VM lifecycle events (load, entry
    /// frame, halt/panic) at debug level.
    #[arg(long)]
    trace: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(false)
            .init();
    }

    let mut vm = match stikvm_vm::Vm::load_file(&cli.file) {
        Ok(vm) => vm,
        Err(code) => return report(code, &cli.file),
    };

    match vm.run() {
        Ok(()) => ExitCode::from(0),
        Err(code) => report(code, &cli.file),
    }
}

/// Prints the panic name and message in red to stderr, matching the original
/// runtime's colored `vm_panic()` line, then returns the process exit code.
fn report(code: u32, file: &std::path::Path) -> ExitCode {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true));

    match Panic::from_code(code) {
        Some(panic) => {
            let _ = writeln!(
                stderr,
                "stikvm: {}: {} ({})",
                panic.name(),
                panic,
                file.display()
            );
        }
        None => {
            // Not one of the interpreter's own codes: an emitter-chosen PANIC
            // opcode argument. There is no name or message to show, only the code.
            let _ = writeln!(stderr, "stikvm: panic {} ({})", code, file.display());
        }
    }

    let _ = stderr.reset();
    ExitCode::from((code & 0xFF) as u8)
}
