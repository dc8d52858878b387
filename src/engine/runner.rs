// External process execution

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

/// Captured result of one finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    /// stdout lines followed by stderr lines
    pub lines: Vec<String>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Last `n` non-empty lines, used for error reports
    pub fn tail(&self, n: usize) -> Vec<String> {
        let lines: Vec<&String> = self.lines.iter().filter(|l| !l.trim().is_empty()).collect();
        let start = lines.len().saturating_sub(n);
        lines[start..].iter().map(|l| l.to_string()).collect()
    }
}

/// Runs an executable to completion and collects its output.
///
/// Timeouts and interruption are the implementor's business; callers block
/// until `run` returns.
pub trait ProcessRunner: Send + Sync {
    /// `lines` holds every stdout line followed by every stderr line. The two
    /// streams are not interleaved in the order the process wrote them.
    fn run(&self, binary: &Path, args: &[String]) -> io::Result<ProcessOutput>;
}

/// Spawns real processes with `std::process::Command`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, binary: &Path, args: &[String]) -> io::Result<ProcessOutput> {
        tracing::debug!(binary = %binary.display(), args = ?args, "spawning");

        let output = Command::new(binary)
            .args(args)
            .stdin(Stdio::null())
            .output()?;

        let mut lines: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect();
        lines.extend(
            String::from_utf8_lossy(&output.stderr)
                .lines()
                .map(str::to_string),
        );

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            lines,
        })
    }
}
