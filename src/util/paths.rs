use std::path::{Component, Path, PathBuf};

/// Resolve `.` and `..` without touching the filesystem. `..` at the root
/// stays at the root. Symlinks are not followed, so this is only a fallback
/// for paths `canonicalize` cannot see.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::Prefix(p) => out.push(p.as_os_str()),
            Component::RootDir   => out.push(Component::RootDir.as_os_str()),
            Component::CurDir    => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => { out.pop(); }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            Component::Normal(s) => out.push(s),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(p: &str) -> String {
        normalize(Path::new(p)).to_string_lossy().into_owned()
    }

    #[test]
    fn parent_segments_leave_the_mount() {
        assert_eq!(norm("/data/../system/x"), "/system/x");
        assert_eq!(norm("/data/media/../app"), "/data/app");
    }

    #[test]
    fn current_dir_segments_dropped() {
        assert_eq!(norm("/data/./media/."), "/data/media");
        assert_eq!(norm("/data//media/"), "/data/media");
    }

    #[test]
    fn never_climbs_above_root() {
        assert_eq!(norm("/../../x"), "/x");
        assert_eq!(norm("/.."), "/");
    }

    #[test]
    fn relative_paths_keep_leading_parents() {
        assert_eq!(norm("../a/./b/.."), "../a");
        assert_eq!(norm("a/.."), ".");
        assert_eq!(norm("../../x"), "../../x");
    }
}
