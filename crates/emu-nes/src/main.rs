//! Headless NES runner.
//!
//! Loads an iNES image, runs a number of frames, then optionally writes a
//! PNG of the last frame and prints the CPU state.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use emu_core::Cpu;
use emu_nes::{Nes, NesConfig, capture};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Cycle-stepped NES emulator (headless).
#[derive(Parser, Debug)]
#[command(name = "emu-nes", version, about, long_about = None)]
struct Args {
    /// iNES ROM file (.nes)
    #[arg(short, long)]
    rom: PathBuf,

    /// Frames to run
    #[arg(short, long, default_value_t = 60)]
    frames: u64,

    /// Save the final frame as a PNG
    #[arg(short, long)]
    screenshot: Option<PathBuf>,

    /// Print this many instructions from the final PC
    #[arg(short, long, value_name = "N")]
    disassemble: Option<usize>,

    /// Print the CPU registers after the run
    #[arg(long)]
    registers: bool,

    /// Log filter, used when RUST_LOG is unset
    #[arg(long, default_value = "emu_nes=info")]
    log: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&args.log).context("invalid --log filter")?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = NesConfig::from_path(&args.rom)?;
    let mut nes = Nes::new(&config)
        .with_context(|| format!("cannot start {}", args.rom.display()))?;

    for _ in 0..args.frames {
        nes.run_frame();
    }
    info!(
        frames = nes.frame_count(),
        pc = format_args!("${:04X}", nes.cpu().pc()),
        "run finished"
    );

    if let Some(path) = &args.screenshot {
        capture::save_screenshot(nes.framebuffer(), path)
            .with_context(|| format!("cannot save {}", path.display()))?;
        info!(path = %path.display(), "screenshot saved");
    }

    if args.registers {
        println!("{}", nes.cpu().registers());
    }

    if let Some(count) = args.disassemble {
        for line in nes.disassemble(nes.cpu().pc(), count) {
            println!("{line}");
        }
    }

    Ok(())
}
