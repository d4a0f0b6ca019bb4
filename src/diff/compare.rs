//! Decision table for one source record

use crate::types::{FileRecord, SyncDecision};

/// Decide what to do with a source record given the matching target record
///
/// 1. **No target record** → Copy
/// 2. **Same fingerprint** → Keep, whatever the timestamps say
/// 3. **Different fingerprint**:
///    - Source timestamp strictly greater → Newer (overwrite)
///    - Otherwise → Older (the target is never replaced by an older source)
///
/// Timestamps compare as their encoded strings, which order chronologically.
pub fn compare_records(source: &FileRecord, target: Option<&FileRecord>) -> SyncDecision {
    let Some(target) = target else {
        return SyncDecision::Copy;
    };

    if source.fingerprint == target.fingerprint {
        return SyncDecision::Keep;
    }

    if source.modified_at.as_str() > target.modified_at.as_str() {
        SyncDecision::Newer
    } else {
        SyncDecision::Older
    }
}
