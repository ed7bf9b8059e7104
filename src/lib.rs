pub mod collectors;
pub mod config;
pub mod models;
pub mod mount_table;
pub mod palette;
pub mod resolver;
pub mod task;
pub mod util;

pub use models::mount::{AccessMode, MountEntry};
pub use models::usage::{classify, DiskUsage, UsageClassification};
pub use mount_table::{MatchMode, MountTable};
pub use resolver::{DiskUsageResolver, MountLookup, Resolution, ResolverSettings, UsageQuery};
