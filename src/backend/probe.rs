//! Tool availability probe.
//!
//! A probe runs the tool with a flag that does nothing but print help or a
//! version string, throws the output away, and looks at the exit code. A
//! missing binary and a non-zero exit both mean "unavailable"; neither is an
//! error.

use crate::config::ToolCommand;
use std::process::Stdio;
use tracing::debug;

/// `true` if `tool <flag>` starts and exits successfully.
pub fn probe(tool: &ToolCommand, flag: &str) -> bool {
    let status = tool
        .command()
        .arg(flag)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match status {
        Ok(s) if s.success() => {
            debug!("Probe `{} {}` succeeded", tool, flag);
            true
        }
        Ok(s) => {
            debug!("Probe `{} {}` exited with {}", tool, flag, s);
            false
        }
        Err(e) => {
            debug!("Probe `{} {}` could not start: {}", tool, flag, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_unavailable() {
        let tool = ToolCommand::new("definitely-not-a-real-pdf-tool-7f3a");
        assert!(!probe(&tool, "--help"));
    }

    #[cfg(unix)]
    #[test]
    fn exit_code_decides_availability() {
        assert!(probe(&ToolCommand::new("sh").arg("-c").arg("exit 0"), "--help"));
        assert!(!probe(&ToolCommand::new("sh").arg("-c").arg("exit 3"), "--help"));
    }
}
