use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};

/// The `/proc/meminfo` fields the estimate needs, in kB.
///
/// Absent fields stay at zero.  `kernel_available` is the kernel's own
/// `MemAvailable` line, only present on 3.14+ kernels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemSnapshot {
    pub mem_free: u64,
    pub active_file: u64,
    pub inactive_file: u64,
    pub sreclaimable: u64,
    pub kernel_available: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemField {
    MemFree,
    ActiveFile,
    InactiveFile,
    SReclaimable,
    MemAvailable,
}

impl MemField {
    /// Map a meminfo key (without the trailing colon) to a tracked field.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "MemFree" => Some(Self::MemFree),
            "Active(file)" => Some(Self::ActiveFile),
            "Inactive(file)" => Some(Self::InactiveFile),
            "SReclaimable" => Some(Self::SReclaimable),
            "MemAvailable" => Some(Self::MemAvailable),
            _ => None,
        }
    }
}

impl MemSnapshot {
    pub fn set(&mut self, field: MemField, kb: u64) {
        match field {
            MemField::MemFree => self.mem_free = kb,
            MemField::ActiveFile => self.active_file = kb,
            MemField::InactiveFile => self.inactive_file = kb,
            MemField::SReclaimable => self.sreclaimable = kb,
            MemField::MemAvailable => self.kernel_available = Some(kb),
        }
    }

    /// Apply one `Key:   value kB` line.  Unknown keys and malformed lines
    /// are ignored; a repeated key overwrites the earlier value.
    pub fn apply_line(&mut self, line: &str) {
        let mut parts = line.split_whitespace();
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            return;
        };
        let Some(field) = key.strip_suffix(':').and_then(MemField::from_key) else {
            return;
        };
        match value.parse() {
            Ok(kb) => self.set(field, kb),
            Err(_) => tracing::trace!("meminfo: ignoring malformed line {line:?}"),
        }
    }
}

pub fn parse_meminfo<I, S>(lines: I) -> MemSnapshot
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut snapshot = MemSnapshot::default();
    for line in lines {
        snapshot.apply_line(line.as_ref());
    }
    snapshot
}

pub fn read_meminfo(path: &Path) -> Result<MemSnapshot> {
    let file = File::open(path).map_err(|e| Error::unavailable(path, e))?;
    let mut snapshot = MemSnapshot::default();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| Error::unavailable(path, e))?;
        snapshot.apply_line(&line);
    }
    tracing::debug!(?snapshot, "read {}", path.display());
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
MemTotal:       16318332 kB
MemFree:          973116 kB
MemAvailable:    9420040 kB
Buffers:          459828 kB
Cached:          8131328 kB
Active:          7049620 kB
Inactive:        6960064 kB
Active(anon):    2902420 kB
Inactive(anon):   777344 kB
Active(file):    4147200 kB
Inactive(file):  6182720 kB
SReclaimable:     561892 kB
SUnreclaim:       138084 kB
HugePages_Total:       0
Hugepagesize:       2048 kB
";

    #[test]
    fn test_parse_sample() {
        let snap = parse_meminfo(SAMPLE.lines());
        assert_eq!(
            snap,
            MemSnapshot {
                mem_free: 973116,
                active_file: 4147200,
                inactive_file: 6182720,
                sreclaimable: 561892,
                kernel_available: Some(9420040),
            }
        );
    }

    #[test]
    fn test_missing_keys_default_to_zero() {
        let snap = parse_meminfo(["MemTotal: 100 kB", "MemFree: 42 kB"]);
        assert_eq!(snap.mem_free, 42);
        assert_eq!(snap.active_file, 0);
        assert_eq!(snap.inactive_file, 0);
        assert_eq!(snap.sreclaimable, 0);
        assert_eq!(snap.kernel_available, None);
    }

    #[test]
    fn test_unit_is_optional() {
        let snap = parse_meminfo(["SReclaimable: 17"]);
        assert_eq!(snap.sreclaimable, 17);
    }

    #[test]
    fn test_malformed_lines_ignored() {
        let snap = parse_meminfo([
            "MemFree:",
            "MemFree: lots kB",
            "MemFree 5 kB",
            "Active(file): -3 kB",
            "MemFree: 9 kB",
        ]);
        assert_eq!(snap.mem_free, 9);
        assert_eq!(snap.active_file, 0);
    }

    #[test]
    fn test_last_occurrence_wins() {
        let snap = parse_meminfo(["MemFree: 1 kB", "MemFree: 2 kB"]);
        assert_eq!(snap.mem_free, 2);
    }

    #[test]
    fn test_lookup_table() {
        assert_eq!(MemField::from_key("Active(file)"), Some(MemField::ActiveFile));
        assert_eq!(MemField::from_key("Active"), None);
        assert_eq!(MemField::from_key("MemFree:"), None);
    }

    #[test]
    fn test_read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meminfo");
        std::fs::write(&path, SAMPLE).unwrap();
        assert_eq!(read_meminfo(&path).unwrap(), parse_meminfo(SAMPLE.lines()));
    }

    #[test]
    fn test_read_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meminfo");
        std::fs::write(&path, b"MemTotal: 100 kB\nMemFree: \xff kB\n").unwrap();
        assert!(matches!(read_meminfo(&path), Err(Error::Unavailable { .. })));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_meminfo(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, Error::Unavailable { .. }), "{err}");
    }
}
