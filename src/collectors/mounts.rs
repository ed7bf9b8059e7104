use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::process::Command;

/// Source of raw mount-table lines.
pub trait MountProvider: Send + Sync {
    /// Current mount lines. An empty table is `Ok(vec![])`, never an error.
    fn mount_lines(&self) -> Result<Vec<String>>;
}

/// Reads a kernel-maintained mounts file (`/proc/mounts` by default).
#[derive(Debug, Clone)]
pub struct ProcMounts {
    pub path: PathBuf,
}

impl Default for ProcMounts {
    fn default() -> Self {
        Self { path: PathBuf::from("/proc/mounts") }
    }
}

impl MountProvider for ProcMounts {
    fn mount_lines(&self) -> Result<Vec<String>> {
        // Mount paths are raw bytes; one non-UTF-8 path must not hide the rest.
        let content = std::fs::read(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        Ok(content
            .split(|b| *b == b'\n')
            .filter(|line| !line.is_empty())
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect())
    }
}

/// Runs the `mount` utility with no arguments and collects its output.
#[derive(Debug, Clone)]
pub struct MountCommand {
    pub program: String,
    pub args:    Vec<String>,
}

impl Default for MountCommand {
    fn default() -> Self {
        Self { program: "mount".into(), args: Vec::new() }
    }
}

impl MountProvider for MountCommand {
    fn mount_lines(&self) -> Result<Vec<String>> {
        let out = Command::new(&self.program)
            .args(&self.args)
            .output()
            .with_context(|| format!("{} not found", self.program))?;

        if !out.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.program,
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&out.stdout).lines().map(String::from).collect())
    }
}
