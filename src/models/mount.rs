use anyhow::{bail, Context, Result};
use serde::Serialize;

/// Filesystem types for which mount/remount actions are offered.
pub const ALLOWED_FS_TYPES: &[&str] = &["rootfs", "tmpfs", "vfat", "ext2", "ext3", "ext4"];

const READ_ONLY:  &str = "ro";
const READ_WRITE: &str = "rw";

/// One mounted filesystem as listed by the mount table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountEntry {
    pub device:      String,
    pub mount_point: String,
    pub fs_type:     String,
    pub options:     Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
    Unknown,
}

impl AccessMode {
    pub fn label(&self) -> &'static str {
        match self {
            AccessMode::ReadOnly  => "ro",
            AccessMode::ReadWrite => "rw",
            AccessMode::Unknown   => "??",
        }
    }

    /// Unknown access is shown as locked.
    pub fn is_locked(&self) -> bool {
        !matches!(self, AccessMode::ReadWrite)
    }
}

impl MountEntry {
    /// Parse one line of mount output. Two layouts are accepted:
    ///
    /// ```text
    /// /dev/block/sda1 /data ext4 rw,nosuid,nodev 0 0
    /// /dev/sda1 on /data type ext4 (rw,nosuid,nodev)
    /// ```
    pub fn parse(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();

        let (device, mount, fs_type, options) =
            if fields.len() >= 5 && fields[1] == "on" && fields[3] == "type" {
                let opts = fields.get(5).copied().unwrap_or("");
                let opts = opts.trim_start_matches('(').trim_end_matches(')');
                (fields[0], fields[2], fields[4], opts)
            } else if fields.len() >= 4 {
                (fields[0], fields[1], fields[2], fields[3])
            } else if fields.len() == 3 {
                (fields[0], fields[1], fields[2], "")
            } else {
                bail!("expected at least 3 fields, got {}", fields.len());
            };

        let mount_point = unescape(mount).with_context(|| format!("bad mount point {:?}", mount))?;
        if !mount_point.starts_with('/') {
            bail!("mount point {:?} is not absolute", mount_point);
        }

        let options = options
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            device:  unescape(device).unwrap_or_else(|_| device.to_string()),
            mount_point,
            fs_type: fs_type.to_string(),
            options,
        })
    }

    /// First mount option starts with "ro". Missing options count as read-only.
    pub fn is_read_only(&self) -> bool {
        match self.options.first() {
            Some(opt) => opt.starts_with(READ_ONLY),
            None      => true,
        }
    }

    /// First mount option starts with "rw". Missing options count as not writable.
    pub fn is_read_write(&self) -> bool {
        match self.options.first() {
            Some(opt) => opt.starts_with(READ_WRITE),
            None      => false,
        }
    }

    pub fn access_mode(&self) -> AccessMode {
        if self.is_read_write()     { AccessMode::ReadWrite }
        else if self.options.first().is_some_and(|o| o.starts_with(READ_ONLY)) { AccessMode::ReadOnly }
        else                        { AccessMode::Unknown }
    }

    pub fn is_mount_allowed(&self) -> bool {
        ALLOWED_FS_TYPES.contains(&self.fs_type.as_str())
    }
}

/// Decode the octal escapes the kernel writes for whitespace and backslashes
/// (`\040`, `\011`, `\012`, `\134`).
fn unescape(raw: &str) -> Result<String> {
    if !raw.contains('\\') {
        return Ok(raw.to_string());
    }
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len()
            && bytes[i + 1..i + 4].iter().all(|b| (b'0'..=b'7').contains(b)) {
            let oct = std::str::from_utf8(&bytes[i + 1..i + 4])?;
            out.push(u8::from_str_radix(oct, 8)?);
            i += 4;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(String::from_utf8(out)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(mount: &str, fs_type: &str, options: &[&str]) -> MountEntry {
        MountEntry {
            device:      "/dev/block/test".into(),
            mount_point: mount.into(),
            fs_type:     fs_type.into(),
            options:     options.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn parses_proc_mounts_line() {
        let e = MountEntry::parse("/dev/block/mmcblk0p9 /system ext4 ro,seclabel,relatime 0 0").unwrap();
        assert_eq!(e.device, "/dev/block/mmcblk0p9");
        assert_eq!(e.mount_point, "/system");
        assert_eq!(e.fs_type, "ext4");
        assert_eq!(e.options, vec!["ro", "seclabel", "relatime"]);
    }

    #[test]
    fn parses_util_linux_mount_line() {
        let e = MountEntry::parse("/dev/sda1 on /boot/efi type vfat (rw,relatime,fmask=0077)").unwrap();
        assert_eq!(e.mount_point, "/boot/efi");
        assert_eq!(e.fs_type, "vfat");
        assert_eq!(e.options.first().map(String::as_str), Some("rw"));
    }

    #[test]
    fn three_field_line_has_no_options() {
        let e = MountEntry::parse("rootfs / rootfs").unwrap();
        assert!(e.options.is_empty());
        assert!(e.is_read_only());
        assert!(!e.is_read_write());
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(MountEntry::parse("").is_err());
        assert!(MountEntry::parse("none proc").is_err());
        assert!(MountEntry::parse("tmpfs relative/path tmpfs rw 0 0").is_err());
    }

    #[test]
    fn decodes_octal_escapes() {
        let e = MountEntry::parse("/dev/sdb1 /media/My\\040Card vfat rw 0 0").unwrap();
        assert_eq!(e.mount_point, "/media/My Card");
    }

    #[test]
    fn ro_and_rw_are_exclusive() {
        let ro = entry("/system", "ext4", &["ro", "relatime"]);
        let rw = entry("/data", "ext4", &["rw", "nosuid"]);
        assert!(ro.is_read_only() && !ro.is_read_write());
        assert!(rw.is_read_write() && !rw.is_read_only());
        assert_eq!(ro.access_mode(), AccessMode::ReadOnly);
        assert_eq!(rw.access_mode(), AccessMode::ReadWrite);
    }

    #[test]
    fn missing_options_default_to_locked() {
        let e = entry("/mnt/x", "ext4", &[]);
        assert!(e.is_read_only());
        assert!(!e.is_read_write());
        assert_eq!(e.access_mode(), AccessMode::Unknown);
        assert!(e.access_mode().is_locked());

        let odd = entry("/mnt/y", "ext4", &["defaults"]);
        assert!(!odd.is_read_only());
        assert!(!odd.is_read_write());
        assert_eq!(odd.access_mode(), AccessMode::Unknown);
    }

    #[test]
    fn mount_allow_list() {
        assert!(entry("/data", "ext4", &["rw"]).is_mount_allowed());
        assert!(entry("/", "rootfs", &["rw"]).is_mount_allowed());
        assert!(!entry("/sys", "sysfs", &["rw"]).is_mount_allowed());
        assert!(!entry("/data", "f2fs", &["rw"]).is_mount_allowed());
    }
}
