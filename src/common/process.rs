//! Helpers for invoking external OS utilities.

use anyhow::{Context, Result};
use std::process::Command;

/// Run a command and require a zero exit status, surfacing stderr on failure.
pub fn run_checked(program: &str, args: &[&str]) -> Result<()> {
    let output = Command::new(program)
        .args(args)
        .output()
        .with_context(|| format!("Failed to run {}", program))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "{} exited with {}: {}",
            program,
            output.status,
            stderr.trim()
        );
    }
    Ok(())
}

/// Run a command and ignore its exit status. Only failing to launch the
/// command at all is an error.
pub fn run_unchecked(program: &str, args: &[&str]) -> Result<()> {
    Command::new(program)
        .args(args)
        .status()
        .with_context(|| format!("Failed to run {}", program))?;
    Ok(())
}
