//! Smoke tests for the `emberc compile` subcommand, driven through the
//! built binary so the CLI's argument parsing and exit-code contract are
//! exercised rather than just the library code underneath it.

use std::process::Command;

fn emberc() -> Command {
    Command::new(env!("CARGO_BIN_EXE_emberc"))
}

#[test]
fn emit_c_writes_a_c_file_and_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("prog.ember");
    std::fs::write(&source, "fn main() { var a = [1, 2, 3]; }\n").unwrap();

    let output = emberc()
        .args(["compile", "--emit-c"])
        .arg(&source)
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let c_path = source.with_extension("c");
    let c_source = std::fs::read_to_string(&c_path).expect("emitted .c file");
    assert!(c_source.contains("#include \"emberc_runtime.h\""));
    assert!(c_source.contains("int main("));
}

#[test]
fn missing_source_file_exits_nonzero_with_error_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("nope.ember");

    let output = emberc().args(["compile"]).arg(&source).output().unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("Error:"), "stderr: {stderr}");
}

#[test]
fn type_error_exits_nonzero_with_error_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("bad.ember");
    std::fs::write(&source, "fn main() { var a: int = \"not an int\"; }\n").unwrap();

    let output = emberc().args(["compile", "--check"]).arg(&source).output().unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("Error:"), "stderr: {stderr}");
}

#[test]
fn check_only_mode_does_not_write_a_c_file() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("prog.ember");
    std::fs::write(&source, "fn main() { var a = 1; }\n").unwrap();

    let output = emberc().args(["compile", "--check"]).arg(&source).output().unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(!source.with_extension("c").exists());
}
