// Copyright (C) 2024 Ethan Uppal. All rights reserved.

use std::{io, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use ls8_vm::{config::Config, program::Program, vm::VM};
use tracing::subscriber::set_global_default;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

/// Runs an LS-8 program image.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Program image: one byte per line as eight binary digits.
    program: PathBuf,

    /// Print the machine state to stderr before every instruction.
    #[arg(long)]
    trace: bool,

    /// Give up after executing this many instructions.
    #[arg(long, value_name = "N")]
    max_steps: Option<u64>,

    /// List the decoded program instead of running it.
    #[arg(long)]
    disassemble: bool,
}

/// Logs go to stderr so they never mix with `PRN` output.
fn setup_tracing() -> anyhow::Result<()> {
    let fmt_layer = fmt::layer().with_target(false).with_writer(io::stderr);
    let sub = Registry::default()
        .with(EnvFilter::from_default_env())
        .with(fmt_layer);
    set_global_default(sub).context("failed to set tracing subscriber")
}

fn main() -> anyhow::Result<()> {
    setup_tracing()?;
    let cli = Cli::parse();

    let program = Program::from_file(&cli.program)?;

    if cli.disassemble {
        for line in program.disassemble() {
            println!("{line}");
        }
        return Ok(());
    }

    let config = Config::default()
        .with_trace(cli.trace)
        .with_step_limit(cli.max_steps);
    let mut vm = VM::new(io::stdout().lock()).with_config(config);
    vm.load_program(&program)?;

    if let Err(error) = vm.run() {
        tracing::error!(pc = vm.pc(), steps = vm.steps(), %error, "machine faulted");
        return Err(error).with_context(|| {
            format!("`{}` stopped at address {:#04x}", cli.program.display(), vm.pc())
        });
    }

    Ok(())
}
