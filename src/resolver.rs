use crate::collectors::mounts::MountProvider;
use crate::collectors::usage::UsageProvider;
use crate::config::Config;
use crate::models::mount::{AccessMode, MountEntry};
use crate::models::usage::{classify, DiskUsage, UsageClassification};
use crate::mount_table::{MatchMode, MountTable};
use crate::palette::ClassificationColors;
use serde::Serialize;

/// Outcome of looking up the mount that owns a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MountLookup {
    Found { entry: MountEntry },
    /// The mount table was read but no entry owns the path.
    NotFound,
    /// The mount table could not be read.
    ProviderError { reason: String },
}

impl MountLookup {
    pub fn entry(&self) -> Option<&MountEntry> {
        match self {
            MountLookup::Found { entry } => Some(entry),
            _ => None,
        }
    }
}

/// Outcome of a usage query. `Unavailable` still carries a zeroed sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UsageQuery {
    Measured { usage: DiskUsage },
    Unavailable { usage: DiskUsage, reason: String },
}

impl UsageQuery {
    pub fn usage(&self) -> &DiskUsage {
        match self {
            UsageQuery::Measured { usage } | UsageQuery::Unavailable { usage, .. } => usage,
        }
    }

    pub fn measured(&self) -> Option<&DiskUsage> {
        match self {
            UsageQuery::Measured { usage } => Some(usage),
            UsageQuery::Unavailable { .. } => None,
        }
    }

    pub fn into_usage(self) -> DiskUsage {
        match self {
            UsageQuery::Measured { usage } | UsageQuery::Unavailable { usage, .. } => usage,
        }
    }
}

/// Everything known about the filesystem owning one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub path:           String,
    pub mount:          MountLookup,
    pub access:         AccessMode,
    pub mount_allowed:  bool,
    pub usage:          Option<UsageQuery>,
    pub classification: UsageClassification,
    pub color:          u32,
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self.mount, MountLookup::Found { .. })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResolverSettings {
    pub warning_threshold: u8,
    pub match_mode:        MatchMode,
    pub colors:            ClassificationColors,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self { warning_threshold: 95, match_mode: MatchMode::Prefix, colors: ClassificationColors::default() }
    }
}

/// Resolves paths to mounts and mounts to usage. Never fails: provider errors
/// come back as `MountLookup::ProviderError` / `UsageQuery::Unavailable`.
pub struct DiskUsageResolver {
    mounts:   Box<dyn MountProvider>,
    usage:    Box<dyn UsageProvider>,
    settings: ResolverSettings,
}

impl DiskUsageResolver {
    pub fn new(mounts: Box<dyn MountProvider>, usage: Box<dyn UsageProvider>, settings: ResolverSettings) -> Self {
        Self { mounts, usage, settings }
    }

    /// Build from config. `colors` should come from `palette::init` so every
    /// resolver in the process shares one pair.
    pub fn from_config(cfg: &Config, colors: ClassificationColors) -> Self {
        let settings = ResolverSettings {
            warning_threshold: cfg.warning_threshold(),
            match_mode:        cfg.mounts.match_mode,
            colors,
        };
        Self::new(cfg.mount_provider(), cfg.usage_provider(), settings)
    }

    pub fn settings(&self) -> &ResolverSettings { &self.settings }

    /// Read the current mount table.
    pub fn mount_table(&self) -> anyhow::Result<MountTable> {
        let lines = self.mounts.mount_lines()?;
        Ok(MountTable::build(lines).with_mode(self.settings.match_mode))
    }

    pub fn resolve_mount_point(&self, path: &str) -> MountLookup {
        let table = match self.mount_table() {
            Ok(t)  => t,
            Err(err) => {
                log::warn!("failed to read mount table for {}: {:#}", path, err);
                return MountLookup::ProviderError { reason: format!("{:#}", err) };
            }
        };
        match table.resolve(path) {
            Some(entry) => MountLookup::Found { entry: entry.clone() },
            None => {
                log::debug!("no mount owns {} ({} entries)", path, table.len());
                MountLookup::NotFound
            }
        }
    }

    pub fn query_usage(&self, entry: &MountEntry) -> UsageQuery {
        match self.usage.usage(&entry.mount_point) {
            Ok(usage) => UsageQuery::Measured { usage },
            Err(err) => {
                log::warn!("failed to load disk usage of {}: {:#}", entry.mount_point, err);
                UsageQuery::Unavailable {
                    usage:  DiskUsage::unavailable(&entry.mount_point),
                    reason: format!("{:#}", err),
                }
            }
        }
    }

    /// Usage of `entry`'s filesystem; all zeros when it cannot be read.
    pub fn get_usage(&self, entry: &MountEntry) -> DiskUsage {
        self.query_usage(entry).into_usage()
    }

    pub fn classify(&self, usage: Option<&DiskUsage>) -> UsageClassification {
        classify(usage, self.settings.warning_threshold)
    }

    /// Mount lookup, usage query and classification for `path`.
    pub fn resolve(&self, path: &str) -> Resolution {
        let mount = self.resolve_mount_point(path);
        let usage = mount.entry().map(|e| self.query_usage(e));
        self.assemble(path, mount, usage)
    }

    pub(crate) fn assemble(&self, path: &str, mount: MountLookup, usage: Option<UsageQuery>) -> Resolution {
        let (access, mount_allowed) = match mount.entry() {
            Some(e) => (e.access_mode(), e.is_mount_allowed()),
            None    => (AccessMode::Unknown, false),
        };
        // A failed query classifies like no sample at all.
        let classification = self.classify(usage.as_ref().and_then(UsageQuery::measured));
        Resolution {
            path: path.to_string(),
            mount,
            access,
            mount_allowed,
            usage,
            color: self.settings.colors.pick(classification.is_warning),
            classification,
        }
    }
}
