/// Milliseconds of wall time as read from the engine's [`Clock`](crate::Clock).
pub type TimestampMs = u64;
