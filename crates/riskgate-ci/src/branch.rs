//! Companion branch naming.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// `{prefix}/change-{change_id}-{unix_millis}-{8 hex}`.
///
/// The random suffix keeps concurrent runs for the same change apart even
/// within one millisecond.
pub fn companion_branch_name(prefix: &str, change_id: u64, now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}/change-{}-{}-{}",
        prefix.trim_matches('/'),
        change_id,
        now.timestamp_millis(),
        &suffix[..8]
    )
}
