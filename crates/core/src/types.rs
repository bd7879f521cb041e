/// All entity identifiers are UUIDs (submissions are keyed by the owning
/// partner's user id in the simple-create path).
pub type EntityId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
