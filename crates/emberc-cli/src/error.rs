//! Errors produced by the `emberc` command-line driver.

use std::fmt;
use std::path::PathBuf;

/// A single driver-level failure, covering every stage between reading the
/// source file and handing a `.c` file to the system C toolchain.
#[derive(Debug)]
pub enum CliError {
    /// The source file could not be read.
    ReadSource { path: PathBuf, source: std::io::Error },
    /// Lexing or parsing failed.
    Syntax(emberc_syntax::ParserError),
    /// Type checking rejected the program. Only the first error is
    /// surfaced; `spec.md` does not ask for multi-error reporting.
    Check(emberc_typecheck::TypeError),
    /// Code generation failed.
    Codegen(emberc_codegen::CodegenError),
    /// The generated `.c` file could not be written.
    WriteOutput { path: PathBuf, source: std::io::Error },
    /// The configured C compiler could not be spawned.
    SpawnToolchain { compiler: String, source: std::io::Error },
    /// The C compiler ran and exited with a failure status.
    ToolchainFailed { compiler: String, status: std::process::ExitStatus },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadSource { path, source } => {
                write!(f, "cannot read '{}': {source}", path.display())
            }
            Self::Syntax(err) => write!(f, "{err}"),
            Self::Check(err) => write!(f, "{err}"),
            Self::Codegen(err) => write!(f, "{err}"),
            Self::WriteOutput { path, source } => {
                write!(f, "cannot write '{}': {source}", path.display())
            }
            Self::SpawnToolchain { compiler, source } => {
                write!(f, "failed to run '{compiler}': {source}")
            }
            Self::ToolchainFailed { compiler, status } => {
                write!(f, "'{compiler}' exited with {status}")
            }
        }
    }
}

impl std::error::Error for CliError {}

impl From<emberc_syntax::ParserError> for CliError {
    fn from(err: emberc_syntax::ParserError) -> Self {
        Self::Syntax(err)
    }
}

impl From<emberc_codegen::CodegenError> for CliError {
    fn from(err: emberc_codegen::CodegenError) -> Self {
        Self::Codegen(err)
    }
}

/// Result alias for the driver.
pub type Result<T> = std::result::Result<T, CliError>;
