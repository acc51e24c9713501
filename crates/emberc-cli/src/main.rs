//! `emberc`: command-line driver for the Ember compiler.
//!
//! `emberc compile <source> [-o out] [--emit-c] [--check | --no-check]
//! [-O0|-O1|-O2] [-v] [--debug]` parses, checks, and lowers an Ember
//! source file to C, then invokes a native C toolchain unless `--emit-c`
//! stops it after emission.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use commands::compile::{self, CompileArgs};

#[derive(Parser)]
#[command(name = "emberc", version, about = "Ember compiler")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile an Ember source file to C, and then to a native binary.
    Compile(CompileArgs),
}

fn main() {
    let cli = Cli::parse();

    let Command::Compile(args) = cli.command;

    emberc_log::set_level(if args.debug {
        emberc_log::Level::Trace
    } else if args.verbose {
        emberc_log::Level::Info
    } else {
        emberc_log::Level::Warn
    });

    if let Err(err) = compile::run(&args) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
