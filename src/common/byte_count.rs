use serde::{Deserialize, Serialize};

/// A number of bytes, as estimated by the reduction memory accounting.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ByteCount(u64);

impl std::fmt::Debug for ByteCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.human_readable())
    }
}

impl std::fmt::Display for ByteCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.human_readable())
    }
}

const SUFFIX_AND_THRESHOLD: [(&str, u64); 4] = [
    ("KB", 1_000),
    ("MB", 1_000_000),
    ("GB", 1_000_000_000),
    ("TB", 1_000_000_000_000),
];

impl ByteCount {
    /// Number of bytes.
    #[inline]
    pub fn get_bytes(&self) -> u64 {
        self.0
    }

    /// Formats the count with a unit, e.g. `1.50 MB`.
    pub fn human_readable(&self) -> String {
        for (suffix, threshold) in SUFFIX_AND_THRESHOLD.iter().rev() {
            if self.get_bytes() >= *threshold {
                let unit_num = self.get_bytes() as f64 / *threshold as f64;
                return format!("{unit_num:.2} {suffix}");
            }
        }
        format!("{} B", self.get_bytes())
    }
}

impl From<u64> for ByteCount {
    fn from(value: u64) -> Self {
        ByteCount(value)
    }
}

impl From<usize> for ByteCount {
    fn from(value: usize) -> Self {
        ByteCount(value as u64)
    }
}

impl PartialEq<u64> for ByteCount {
    #[inline]
    fn eq(&self, other: &u64) -> bool {
        self.get_bytes() == *other
    }
}

impl PartialOrd<u64> for ByteCount {
    #[inline]
    fn partial_cmp(&self, other: &u64) -> Option<std::cmp::Ordering> {
        self.get_bytes().partial_cmp(other)
    }
}
