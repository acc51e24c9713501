//! The `emberc compile` command: source file to executable (or `.c` file).

use crate::error::{CliError, Result};
use emberc_codegen::{lower_program, ArithmeticMode, Lowering};
use emberc_log::{debug, info};
use emberc_syntax::parse_source;
use emberc_typecheck::check_program;
use std::path::PathBuf;
use std::process::Command;

/// `emberc compile` arguments, matching `spec.md` §6's external interface.
#[derive(clap::Args, Debug)]
pub struct CompileArgs {
    /// Ember source file to compile.
    pub source: PathBuf,

    /// Output path. Defaults to the source's file stem (an executable),
    /// or `<stem>.c` when `--emit-c` is given.
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Stop after emitting the `.c` file; do not invoke a C toolchain.
    #[arg(long)]
    pub emit_c: bool,

    /// Stop after type checking; do not generate code.
    #[arg(long, overrides_with = "no_check")]
    pub check: bool,

    /// Run the full pipeline (parse, check, generate, compile). Default.
    #[arg(long, overrides_with = "check")]
    pub no_check: bool,

    /// Optimization level passed through to the C compiler.
    #[arg(
        short = 'O',
        value_name = "LEVEL",
        default_value_t = 1,
        value_parser = clap::value_parser!(u8).range(0..=2)
    )]
    pub opt_level: u8,

    /// Verbose (info-level) logging.
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Debug (trace-level) logging.
    #[arg(long)]
    pub debug: bool,
}

/// Runs the `compile` command end to end, returning an error carrying the
/// diagnostic the caller prints with an `Error:` prefix.
pub fn run(args: &CompileArgs) -> Result<()> {
    let source_text = std::fs::read_to_string(&args.source).map_err(|source| {
        CliError::ReadSource {
            path: args.source.clone(),
            source,
        }
    })?;

    info!("parsing {}", args.source.display());
    let (decls, interner) = parse_source(&source_text)?;

    info!("checking {}", args.source.display());
    let checked = check_program(&decls, &interner)
        .map_err(|mut errors| CliError::Check(errors.remove(0)))?;

    if args.check {
        info!("{} checks ok", args.source.display());
        return Ok(());
    }

    debug!("{} function signature(s) recorded", checked.signatures.len());

    let arithmetic_mode = if args.opt_level == 0 {
        ArithmeticMode::Checked
    } else {
        ArithmeticMode::Unchecked
    };
    let mut lowering = Lowering::new(
        &interner,
        &checked.signatures,
        &checked.tail_calls,
        arithmetic_mode,
    );
    let c_source = lower_program(&decls, &mut lowering)?;

    let c_path = c_output_path(args);
    info!("writing {}", c_path.display());
    std::fs::write(&c_path, &c_source).map_err(|source| CliError::WriteOutput {
        path: c_path.clone(),
        source,
    })?;

    if args.emit_c {
        return Ok(());
    }

    let binary_path = binary_output_path(args);
    invoke_toolchain(&c_path, &binary_path, args.opt_level)
}

fn c_output_path(args: &CompileArgs) -> PathBuf {
    if args.emit_c {
        if let Some(out) = &args.output {
            return out.clone();
        }
    }
    args.source.with_extension("c")
}

fn binary_output_path(args: &CompileArgs) -> PathBuf {
    if let Some(out) = &args.output {
        return out.clone();
    }
    args.source.with_extension("")
}

fn invoke_toolchain(c_path: &std::path::Path, binary_path: &std::path::Path, opt_level: u8) -> Result<()> {
    let compiler = std::env::var("CC").unwrap_or_else(|_| "cc".to_string());
    let opt_flag = format!("-O{opt_level}");

    info!("invoking {compiler} {opt_flag}");
    let status = Command::new(&compiler)
        .arg(&opt_flag)
        .arg(c_path)
        .arg("-o")
        .arg(binary_path)
        .status()
        .map_err(|source| CliError::SpawnToolchain {
            compiler: compiler.clone(),
            source,
        })?;

    if !status.success() {
        return Err(CliError::ToolchainFailed { compiler, status });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(source: &str) -> CompileArgs {
        CompileArgs {
            source: PathBuf::from(source),
            output: None,
            emit_c: false,
            check: false,
            no_check: false,
            opt_level: 1,
            verbose: false,
            debug: false,
        }
    }

    #[test]
    fn c_output_path_defaults_to_sibling_c_file() {
        let mut a = args("prog.ember");
        a.emit_c = true;
        assert_eq!(c_output_path(&a), PathBuf::from("prog.c"));
    }

    #[test]
    fn c_output_path_honors_output_flag_under_emit_c() {
        let mut a = args("prog.ember");
        a.emit_c = true;
        a.output = Some(PathBuf::from("out.c"));
        assert_eq!(c_output_path(&a), PathBuf::from("out.c"));
    }

    #[test]
    fn binary_output_path_defaults_to_stem() {
        let a = args("prog.ember");
        assert_eq!(binary_output_path(&a), PathBuf::from("prog"));
    }

    #[test]
    fn compile_reports_missing_source_file() {
        let a = args("does-not-exist.ember");
        let err = run(&a).unwrap_err();
        assert!(matches!(err, CliError::ReadSource { .. }));
    }
}
