use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of work a logged change represents. Deletions and directory changes never make it into
/// the log, so there is no variant for them.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize, Clone, Copy, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Created,
    Modified,
    Moved,
}

/// One line of the activity log. Lines are never rewritten, so field names and types here are
/// frozen. New fields must be optional so older lines keep parsing.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize, Clone)]
pub struct ActivityRecordEntity {
    pub timestamp: DateTime<Utc>,
    pub project: Arc<str>,
    pub event_kind: ActivityKind,
}
