use crate::collectors::mounts::{MountCommand, MountProvider, ProcMounts};
use crate::collectors::usage::{DfCommand, Statvfs, UsageProvider};
use crate::mount_table::MatchMode;
use crate::palette::ClassificationColors;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub usage: UsageConfig,

    #[serde(default)]
    pub mounts: MountsConfig,

    #[serde(default)]
    pub colors: ClassificationColors,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageConfig {
    /// Percent used at or above which a filesystem is flagged (0-100).
    pub warning_threshold_pct: u8,
    /// Where usage numbers come from.
    pub source: UsageSource,
    /// Program run when `source = "df"`.
    pub df_program: String,
    /// Arguments placed before the mount point. Old toolbox `df` takes none.
    pub df_args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageSource {
    Statvfs,
    Df,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MountsConfig {
    pub source: MountSource,
    /// Mount table read when `source = "proc"`.
    pub mounts_file: PathBuf,
    /// Program run when `source = "command"`.
    pub mount_program: String,
    /// "prefix" keeps plain string matching, "component" stops at path separators.
    pub match_mode: MatchMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MountSource {
    Proc,
    Command,
}

// ── Defaults ─────────────────────────────────────────────────────────

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            warning_threshold_pct: 95,
            source:     UsageSource::Statvfs,
            df_program: "df".into(),
            df_args:    vec!["-k".into()],
        }
    }
}

impl Default for MountsConfig {
    fn default() -> Self {
        Self {
            source:        MountSource::Proc,
            mounts_file:   PathBuf::from("/proc/mounts"),
            mount_program: "mount".into(),
            match_mode:    MatchMode::Prefix,
        }
    }
}

// ── Providers ─────────────────────────────────────────────────────────

impl Config {
    pub fn warning_threshold(&self) -> u8 {
        self.usage.warning_threshold_pct.min(100)
    }

    pub fn mount_provider(&self) -> Box<dyn MountProvider> {
        match self.mounts.source {
            MountSource::Proc    => Box::new(ProcMounts { path: self.mounts.mounts_file.clone() }),
            MountSource::Command => Box::new(MountCommand {
                program: self.mounts.mount_program.clone(),
                args:    Vec::new(),
            }),
        }
    }

    pub fn usage_provider(&self) -> Box<dyn UsageProvider> {
        match self.usage.source {
            UsageSource::Statvfs => Box::new(Statvfs),
            UsageSource::Df      => Box::new(DfCommand {
                program: self.usage.df_program.clone(),
                args:    self.usage.df_args.clone(),
            }),
        }
    }
}

// ── Load / Save ───────────────────────────────────────────────────────

impl Config {
    pub fn load() -> Self {
        match try_load() {
            Ok(c)  => c,
            Err(err) => {
                log::debug!("using default config: {:#}", err);
                // Write defaults on first run (best-effort)
                if let Err(err) = try_write_defaults() {
                    log::debug!("could not write default config: {:#}", err);
                }
                Config::default()
            }
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mountscope").join("mountscope.toml"))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

fn try_load() -> Result<Config> {
    let path = Config::config_path().ok_or_else(|| anyhow::anyhow!("no config dir"))?;
    let text = fs::read_to_string(path)?;
    Config::from_toml(&text)
}

fn try_write_defaults() -> Result<()> {
    let path = Config::config_path().ok_or_else(|| anyhow::anyhow!("no config dir"))?;
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let text = toml::to_string_pretty(&Config::default())?;
    fs::write(path, format!("# mountscope configuration\n# Generated on first run, edit freely\n\n{}", text))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = Config::from_toml("").unwrap();
        assert_eq!(cfg.warning_threshold(), 95);
        assert_eq!(cfg.usage.source, UsageSource::Statvfs);
        assert_eq!(cfg.usage.df_args, vec!["-k"]);
        assert_eq!(cfg.mounts.source, MountSource::Proc);
        assert_eq!(cfg.mounts.match_mode, MatchMode::Prefix);
        assert_eq!(cfg.colors, ClassificationColors::default());
    }

    #[test]
    fn parses_every_section() {
        let cfg = Config::from_toml(r#"
            [usage]
            warning_threshold_pct = 80
            source = "df"
            df_program = "/system/bin/df"
            df_args = []

            [mounts]
            source = "command"
            mounts_file = "/proc/self/mounts"
            mount_program = "/system/bin/mount"
            match_mode = "component"

            [colors]
            normal = 1
            warning = 2
        "#).unwrap();
        assert_eq!(cfg.warning_threshold(), 80);
        assert_eq!(cfg.usage.source, UsageSource::Df);
        assert_eq!(cfg.usage.df_program, "/system/bin/df");
        assert!(cfg.usage.df_args.is_empty());
        assert_eq!(cfg.mounts.source, MountSource::Command);
        assert_eq!(cfg.mounts.match_mode, MatchMode::Component);
        assert_eq!(cfg.colors, ClassificationColors { normal: 1, warning: 2 });
    }

    #[test]
    fn threshold_is_clamped() {
        let cfg = Config::from_toml("[usage]\nwarning_threshold_pct = 250\n").unwrap();
        assert_eq!(cfg.warning_threshold(), 100);
    }

    #[test]
    fn unknown_source_is_rejected() {
        assert!(Config::from_toml("[mounts]\nsource = \"zfs\"\n").is_err());
    }

    #[test]
    fn defaults_round_trip_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let back = Config::from_toml(&text).unwrap();
        assert_eq!(back.warning_threshold(), 95);
        assert_eq!(back.mounts.mounts_file, PathBuf::from("/proc/mounts"));
    }
}
