use crate::models::mount::MountEntry;
use serde::{Deserialize, Serialize};

/// How a mount point is matched against a query path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Plain string prefix: `/data` also owns `/database`.
    #[default]
    Prefix,
    /// Prefix must end at a path separator: `/data` owns `/data/x`, not `/database`.
    Component,
}

impl MatchMode {
    pub fn matches(&self, mount_point: &str, path: &str) -> bool {
        if !path.starts_with(mount_point) {
            return false;
        }
        match self {
            MatchMode::Prefix    => true,
            MatchMode::Component => {
                mount_point.ends_with('/')
                    || path.len() == mount_point.len()
                    || path.as_bytes()[mount_point.len()] == b'/'
            }
        }
    }
}

/// Snapshot of the mounted filesystems, most specific mount point first.
#[derive(Debug, Clone, Default)]
pub struct MountTable {
    entries: Vec<MountEntry>,
    mode:    MatchMode,
}

impl MountTable {
    /// Parse raw mount lines; unparsable lines are skipped.
    pub fn build<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = lines
            .into_iter()
            .filter_map(|line| {
                let line = line.as_ref();
                if line.trim().is_empty() { return None; }
                match MountEntry::parse(line) {
                    Ok(e)  => Some(e),
                    Err(err) => {
                        log::debug!("skipping mount line {:?}: {:#}", line, err);
                        None
                    }
                }
            })
            .collect();
        Self::from_entries(entries)
    }

    pub fn from_entries(mut entries: Vec<MountEntry>) -> Self {
        sort_longest_first(&mut entries);
        Self { entries, mode: MatchMode::default() }
    }

    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// The entry with the longest mount point owning `path`, if any.
    pub fn resolve(&self, path: &str) -> Option<&MountEntry> {
        self.entries.iter().find(|e| self.mode.matches(&e.mount_point, path))
    }

    pub fn entries(&self) -> &[MountEntry] { &self.entries }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

// Stable, so stacked mounts on the same point keep their listed order.
fn sort_longest_first(entries: &mut [MountEntry]) {
    entries.sort_by(|a, b| b.mount_point.len().cmp(&a.mount_point.len()));
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANDROID_MOUNTS: &str = "\
rootfs / rootfs ro,seclabel,relatime 0 0
tmpfs /dev tmpfs rw,seclabel,nosuid,relatime,mode=755 0 0
proc /proc proc rw,relatime 0 0
/dev/block/platform/msm_sdcc.1/by-name/system /system ext4 ro,seclabel,relatime 0 0
/dev/block/platform/msm_sdcc.1/by-name/userdata /data ext4 rw,seclabel,nosuid,nodev 0 0
/dev/fuse /data/media fuse rw,nosuid,nodev,relatime 0 0
/dev/fuse /storage/emulated/0 fuse rw,nosuid,nodev 0 0
garbage
";

    fn raw(mount: &str, fs: &str, opts: &str) -> String {
        format!("/dev/block/x {} {} {} 0 0", mount, fs, opts)
    }

    #[test]
    fn skips_malformed_lines() {
        let table = MountTable::build(ANDROID_MOUNTS.lines());
        assert_eq!(table.len(), 7);
    }

    #[test]
    fn sorted_longest_first() {
        let table = MountTable::build(ANDROID_MOUNTS.lines());
        let lens: Vec<usize> = table.entries().iter().map(|e| e.mount_point.len()).collect();
        assert!(lens.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(table.entries().last().unwrap().mount_point, "/");
    }

    #[test]
    fn sorting_is_idempotent() {
        let once = MountTable::build(ANDROID_MOUNTS.lines());
        let twice = MountTable::from_entries(once.entries().to_vec());
        assert_eq!(once.entries(), twice.entries());
    }

    #[test]
    fn resolves_longest_prefix() {
        let lines = [
            raw("/", "ext4", "rw"),
            raw("/data", "ext4", "rw"),
            raw("/data/media", "vfat", "ro"),
        ];
        let table = MountTable::build(lines.iter());
        let hit = table.resolve("/data/media/DCIM").unwrap();
        assert_eq!(hit.mount_point, "/data/media");
        assert!(hit.is_read_only());

        assert_eq!(table.resolve("/data/app").unwrap().mount_point, "/data");
        assert_eq!(table.resolve("/sdcard").unwrap().mount_point, "/");
    }

    #[test]
    fn resolve_matches_brute_force_longest() {
        let table = MountTable::build(ANDROID_MOUNTS.lines());
        for path in ["/", "/data/media/0", "/storage/emulated/0/Music", "/system/bin", "/proc/1", "/devices"] {
            let expected = table.entries().iter()
                .filter(|e| path.starts_with(&e.mount_point))
                .max_by_key(|e| e.mount_point.len())
                .map(|e| e.mount_point.clone());
            assert_eq!(table.resolve(path).map(|e| e.mount_point.clone()), expected, "{}", path);
        }
    }

    #[test]
    fn not_found_without_root() {
        let table = MountTable::build([raw("/data", "ext4", "rw")]);
        assert!(table.resolve("/system").is_none());
        assert!(MountTable::build(Vec::<String>::new()).resolve("/").is_none());
    }

    #[test]
    fn prefix_mode_matches_sibling_names() {
        let table = MountTable::build([raw("/", "rootfs", "ro"), raw("/data", "ext4", "rw")]);
        assert_eq!(table.resolve("/database").unwrap().mount_point, "/data");
    }

    #[test]
    fn component_mode_respects_separators() {
        let table = MountTable::build([raw("/", "rootfs", "ro"), raw("/data", "ext4", "rw")])
            .with_mode(MatchMode::Component);
        assert_eq!(table.resolve("/database").unwrap().mount_point, "/");
        assert_eq!(table.resolve("/data").unwrap().mount_point, "/data");
        assert_eq!(table.resolve("/data/app").unwrap().mount_point, "/data");
    }
}
