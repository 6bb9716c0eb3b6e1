//! LS-8 Emulator - CLI Entry Point
//!
//! Commands:
//! - `ls8 run <program>` - Run a program image until it halts
//! - `ls8 debug <program>` - Interactive debugger
//! - `ls8 disasm <program>` - Disassemble a program image

use clap::{Parser, Subcommand};
use log::LevelFilter;
use simple_logger::SimpleLogger;

#[derive(Parser)]
#[command(name = "ls8")]
#[command(version = "0.1.0")]
#[command(about = "An emulator for the LS-8 8-bit register machine")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the .ls8 program image
        program: String,
        /// Maximum number of instructions to execute (0 = no limit)
        #[arg(short, long, default_value = "0")]
        max_cycles: u64,
        /// Print a trace line to stderr before each instruction
        #[arg(short, long)]
        trace: bool,
        /// Write the final machine state as JSON
        #[arg(short, long)]
        dump: Option<String>,
    },
    /// Step through a program interactively
    #[cfg(feature = "tui")]
    Debug {
        /// Path to the .ls8 program image
        program: String,
    },
    /// Disassemble a program image
    Disasm {
        /// Path to the .ls8 program image
        program: String,
    },
}

fn main() {
    let cli = Cli::parse();

    // The debugger owns the terminal; log records would draw over it.
    #[cfg(feature = "tui")]
    let owns_terminal = matches!(cli.command, Commands::Debug { .. });
    #[cfg(not(feature = "tui"))]
    let owns_terminal = false;
    if !owns_terminal {
        init_logging(cli.verbose);
    }

    match cli.command {
        Commands::Run { program, max_cycles, trace, dump } => {
            run_program(&program, max_cycles, trace, dump.as_deref());
        }
        #[cfg(feature = "tui")]
        Commands::Debug { program } => {
            debug_program(&program);
        }
        Commands::Disasm { program } => {
            disassemble_file(&program);
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    // Records go to stderr (the `stderr` feature); stdout carries PRN output only.
    if let Err(e) = SimpleLogger::new().with_level(level).init() {
        eprintln!("Failed to initialize logging: {}", e);
    }
}

fn load_or_exit(path: &str) -> Vec<u8> {
    match ls8::load_image(path) {
        Ok(image) => image.bytes,
        Err(e) => {
            eprintln!("Failed to load {}: {}", path, e);
            std::process::exit(1);
        }
    }
}

fn run_program(path: &str, max_cycles: u64, trace: bool, dump: Option<&str>) {
    use ls8::Cpu;

    let program = load_or_exit(path);

    let mut cpu = Cpu::new();
    if let Err(e) = cpu.load_program(&program) {
        eprintln!("Failed to load program: {}", e);
        std::process::exit(1);
    }

    let mut failed = false;
    while cpu.is_running() && (max_cycles == 0 || cpu.cycles < max_cycles) {
        if trace {
            eprintln!("{}", cpu.trace());
        }

        let pc = cpu.regs.pc;
        if let Err(e) = cpu.step() {
            eprintln!("CPU error at PC={:02X}: {}", pc, e);
            failed = true;
            break;
        }
    }

    if cpu.is_running() {
        eprintln!("Reached max cycles limit ({}). Use --max-cycles to increase.", max_cycles);
    }

    if let Some(dump_path) = dump {
        let written = cpu
            .snapshot()
            .to_json()
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(dump_path, json).map_err(|e| e.to_string()));
        if let Err(e) = written {
            eprintln!("Failed to write state to {}: {}", dump_path, e);
            failed = true;
        }
    }

    if failed {
        std::process::exit(1);
    }
}

#[cfg(feature = "tui")]
fn debug_program(path: &str) {
    let program = load_or_exit(path);

    if let Err(e) = ls8::run_debugger(program) {
        eprintln!("Debugger error: {}", e);
        std::process::exit(1);
    }
}

fn disassemble_file(path: &str) {
    let program = load_or_exit(path);
    print!("{}", ls8::disassemble(&program));
}
