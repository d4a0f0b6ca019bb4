//! SyncDecision - Outcome of comparing a source record with its target

/// Decision made by the diff engine for one source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
    /// No target record exists
    Copy,

    /// Fingerprints match, nothing to do
    Keep,

    /// Fingerprints differ and the source is more recent
    Newer,

    /// Fingerprints differ but the target is as recent or more recent
    Older,
}

impl SyncDecision {
    /// Whether this decision invokes a copy primitive
    pub fn requires_copy(self) -> bool {
        matches!(self, SyncDecision::Copy | SyncDecision::Newer)
    }

    /// Whether a target record took part in the comparison
    pub fn was_compared(self) -> bool {
        !matches!(self, SyncDecision::Copy)
    }

    pub fn action_name(self) -> &'static str {
        match self {
            SyncDecision::Copy => "Copy",
            SyncDecision::Keep => "Keep",
            SyncDecision::Newer => "Update",
            SyncDecision::Older => "Protect",
        }
    }
}
