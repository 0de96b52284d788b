use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rv64emu::Cpu;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Flat binary image executed from the base of guest RAM.
    binary: PathBuf,

    /// Stop after executing this many instructions.
    #[arg(long, value_name = "N")]
    max_instructions: Option<u64>,

    /// Dump the first N bytes of guest memory after the run.
    #[arg(long, value_name = "N")]
    dump_memory: Option<usize>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let code = match fs::read(&args.binary) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: cannot read {}: {}", args.binary.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let mut cpu = match Cpu::new(&code) {
        Ok(cpu) => cpu,
        Err(trap) => {
            eprintln!(
                "error: cannot load {} ({} bytes): {}",
                args.binary.display(),
                code.len(),
                trap
            );
            return ExitCode::FAILURE;
        }
    };

    if let Err(trap) = cpu.run(args.max_instructions) {
        eprintln!("fault: {} (pc = {:#x})", trap, cpu.pc);
    }
    info!(instructions = cpu.instruction_count(), "run finished");

    print!("{}", cpu.dump_registers());
    if let Some(len) = args.dump_memory {
        print!("{}", cpu.memory().dump(len));
    }

    ExitCode::SUCCESS
}
