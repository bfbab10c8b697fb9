mod tests_normalize;

use crate::semantic::symbol::{Volume, VolumeEntry};

/// Build a volume literal for assertions.
pub(crate) fn volume(entries: &[(&str, &[u32])]) -> Volume {
    entries
        .iter()
        .map(|(name, lines)| (name.to_string(), VolumeEntry::at(lines.to_vec())))
        .collect()
}
