//! LS-8 Emulator - CLI Entry Point
//!
//! Commands:
//! - `ls8-emu <program>` - Run an .ls8 image or .asm source
//! - `ls8-emu asm <source>` - Assemble to an .ls8 image
//! - `ls8-emu disasm <image>` - Disassemble an .ls8 image

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand};
use ls8::error::{EXIT_INVALID_SOURCE, EXIT_SUCCESS};
use ls8::{AddressPolicy, Machine, MachineConfig};

#[derive(Parser)]
#[command(name = "ls8-emu")]
#[command(version)]
#[command(about = "An emulator for the LS-8 8-bit register machine")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Args)]
struct RunArgs {
    /// Path to the .ls8 image (or .asm source) to execute
    program: Option<PathBuf>,
    /// Print a trace line to stderr before every instruction
    #[arg(short, long)]
    trace: bool,
    /// Stop with an error after this many instructions
    #[arg(short, long)]
    max_cycles: Option<u64>,
    /// Wrap out-of-range addresses instead of faulting
    #[arg(long)]
    wrap: bool,
    /// Print the final machine state as JSON to stderr
    #[arg(long)]
    dump_state: bool,
    /// Open the interactive debugger instead of running
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble source to an .ls8 image
    Asm {
        /// Path to the source file
        source: PathBuf,
        /// Output image (defaults to the source path with an .ls8 extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Disassemble an .ls8 image to readable text
    Disasm {
        /// Path to the .ls8 image
        image: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let code = match cli.command {
        Some(Commands::Asm { source, output }) => assemble_file(&source, output),
        Some(Commands::Disasm { image }) => disassemble_file(&image),
        None => match &cli.run.program {
            Some(program) => run_program(program, &cli.run),
            None => Cli::command()
                .error(ErrorKind::MissingRequiredArgument, "a program to run is required")
                .exit(),
        },
    };

    ExitCode::from(code)
}

fn run_program(path: &Path, args: &RunArgs) -> u8 {
    let program = match ls8::load_source(path) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("error: {}", e);
            return e.exit_code();
        }
    };

    let config = MachineConfig {
        address_policy: if args.wrap { AddressPolicy::Wrap } else { AddressPolicy::Fault },
        max_cycles: args.max_cycles,
    };
    let mut machine = Machine::with_config(config);
    if let Err(e) = machine.load(&program) {
        let e = ls8::Error::from(e);
        eprintln!("error: {}", e);
        return e.exit_code();
    }

    if args.debug {
        return debug_machine(machine);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let result = if args.trace {
        machine.run_with(&mut out, |m| eprintln!("{}", m.trace()))
    } else {
        machine.run(&mut out)
    };
    if let Err(e) = out.flush() {
        eprintln!("error: failed to flush output: {}", e);
    }

    if args.dump_state {
        match serde_json::to_string_pretty(&machine) {
            Ok(json) => eprintln!("{}", json),
            Err(e) => eprintln!("error: failed to serialize machine state: {}", e),
        }
    }

    match result {
        Ok(_) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: {} (after {} instructions)", e, machine.cycles);
            e.exit_code()
        }
    }
}

#[cfg(feature = "tui")]
fn debug_machine(machine: Machine) -> u8 {
    match ls8::run_debugger(machine) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("❌ Debugger error: {}", e);
            ls8::error::EXIT_ILLEGAL_INSTRUCTION
        }
    }
}

#[cfg(not(feature = "tui"))]
fn debug_machine(_machine: Machine) -> u8 {
    eprintln!("error: this build does not include the debugger (enable the `tui` feature)");
    ls8::error::EXIT_USAGE
}

fn assemble_file(source_path: &Path, output: Option<PathBuf>) -> u8 {
    let out_path = output.unwrap_or_else(|| source_path.with_extension("ls8"));

    println!("📝 Assembling: {} → {}", source_path.display(), out_path.display());

    let source = match std::fs::read_to_string(source_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Failed to read file: {}", e);
            return EXIT_INVALID_SOURCE;
        }
    };

    let bytes = match ls8::assemble(&source) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("❌ Assembly error: {}", e);
            return EXIT_INVALID_SOURCE;
        }
    };

    println!("✓ Assembled {} bytes", bytes.len());

    if let Err(e) = ls8::save_image(&out_path, &bytes) {
        eprintln!("❌ Failed to save image: {}", e);
        return EXIT_INVALID_SOURCE;
    }

    println!("✓ Saved to {}", out_path.display());
    EXIT_SUCCESS
}

fn disassemble_file(image_path: &Path) -> u8 {
    let bytes = match ls8::load_image(image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("❌ Failed to load image: {}", e);
            return EXIT_INVALID_SOURCE;
        }
    };

    print!("{}", ls8::disassemble(&bytes));
    EXIT_SUCCESS
}
