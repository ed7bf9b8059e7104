use crate::models::usage::DiskUsage;
use anyhow::{bail, Context, Result};
use std::process::Command;

/// Source of space accounting for a mounted filesystem.
pub trait UsageProvider: Send + Sync {
    fn usage(&self, mount_point: &str) -> Result<DiskUsage>;
}

/// `statvfs(2)` on the mount point.
#[derive(Debug, Clone, Copy, Default)]
pub struct Statvfs;

impl UsageProvider for Statvfs {
    fn usage(&self, mount_point: &str) -> Result<DiskUsage> {
        use nix::sys::statvfs::statvfs;
        let stat = statvfs(mount_point).with_context(|| format!("statvfs {}", mount_point))?;

        // Block counts are u32 on 32-bit Android, u64 elsewhere.
        let frsize = u64::from(stat.fragment_size());
        let total_bytes = u64::from(stat.blocks()) * frsize;
        let free_bytes  = u64::from(stat.blocks_available()) * frsize;
        let used_bytes  = total_bytes.saturating_sub(u64::from(stat.blocks_free()) * frsize);

        Ok(DiskUsage { mount_point: mount_point.to_string(), total_bytes, used_bytes, free_bytes })
    }
}

/// Runs `df` on the mount point and parses the single data row.
#[derive(Debug, Clone)]
pub struct DfCommand {
    pub program: String,
    pub args:    Vec<String>,
}

impl Default for DfCommand {
    fn default() -> Self {
        Self { program: "df".into(), args: vec!["-k".into()] }
    }
}

impl UsageProvider for DfCommand {
    fn usage(&self, mount_point: &str) -> Result<DiskUsage> {
        let out = Command::new(&self.program)
            .args(&self.args)
            .arg(mount_point)
            .output()
            .with_context(|| format!("{} not found", self.program))?;

        if !out.status.success() {
            bail!(
                "{} {} exited with {}: {}",
                self.program,
                mount_point,
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            );
        }
        parse_df(&String::from_utf8_lossy(&out.stdout), mount_point)
    }
}

/// Parse `df` output. Handles the POSIX layout
///
/// ```text
/// Filesystem     1K-blocks     Used Available Use% Mounted on
/// /dev/sda2      102687672 51234560  46213452  53% /
/// ```
///
/// and the Android toolbox layout
///
/// ```text
/// Filesystem             Size   Used   Free   Blksize
/// /data                 12.9G   4.5G   8.4G   4096
/// ```
///
/// Long device names that wrap onto their own line are rejoined.
pub fn parse_df(output: &str, mount_point: &str) -> Result<DiskUsage> {
    let mut lines = output.lines().filter(|l| !l.trim().is_empty());
    let header = lines.next().context("empty df output")?;
    if !header.starts_with("Filesystem") {
        bail!("unexpected df header: {:?}", header);
    }

    let fields: Vec<&str> = lines.flat_map(str::split_whitespace).collect();
    if fields.len() < 4 {
        bail!("df row has {} fields, expected at least 4", fields.len());
    }

    let (total_bytes, used_bytes, free_bytes) = if header.contains("1K-blocks") || header.contains("1024-blocks") {
        let kb = |s: &str| -> Result<u64> {
            Ok(s.parse::<u64>().with_context(|| format!("bad block count {:?}", s))? * 1024)
        };
        (kb(fields[1])?, kb(fields[2])?, kb(fields[3])?)
    } else {
        (parse_size(fields[1])?, parse_size(fields[2])?, parse_size(fields[3])?)
    };

    Ok(DiskUsage { mount_point: mount_point.to_string(), total_bytes, used_bytes, free_bytes })
}

/// "12.9G" → bytes. Bare numbers are bytes.
fn parse_size(s: &str) -> Result<u64> {
    const UNITS: &[(char, f64)] = &[
        ('K', 1024.0),
        ('M', 1_048_576.0),
        ('G', 1_073_741_824.0),
        ('T', 1_099_511_627_776.0),
    ];
    let (num, mult) = match UNITS.iter().find(|(u, _)| s.ends_with(*u)) {
        Some((_, m)) => (&s[..s.len() - 1], *m),
        None         => (s, 1.0),
    };
    let v: f64 = num.parse().with_context(|| format!("bad size {:?}", s))?;
    if v < 0.0 || !v.is_finite() {
        bail!("bad size {:?}", s);
    }
    Ok((v * mult) as u64)
}
