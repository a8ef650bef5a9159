//! Protocol-visible timing constants.

/// Period of the heartbeat tick.
pub const HEARTBEAT_INTERVAL_MS: u64 = 1000;

/// Period of the stale-peer sweep.
pub const CLEANUP_INTERVAL_MS: u64 = 5000;

/// A peer unheard from for longer than this is considered dead: it is
/// evicted on the next sweep and is ineligible as a leader candidate.
pub const WINDOW_TIMEOUT_MS: u64 = 5000;

/// Number of heartbeat ticks after boot during which leader election is
/// deferred, so concurrently-starting peers discover each other first.
pub const GRACE_PERIOD_TICKS: u32 = 3;
