//! Session-channel derivation.
//!
//! The session channel is a pure function of the boot layout descriptor
//! string, so peers configured with the same descriptor discover each other
//! without any handshake.

/// Prefix of derived session channel names.
const SESSION_PREFIX: &str = "mesh-";

/// Channel used when no layout descriptor was supplied.
const DEFAULT_SESSION: &str = "default";

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a over a byte string.
///
/// Protocol-visible: every peer must derive identical values, so this stays
/// independent of `std`'s process-seeded hashers.
pub fn hash32(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET;
    for byte in bytes {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Derives the session channel for a layout descriptor string.
///
/// The empty descriptor maps to the literal `"default"`.
pub fn session_id(descriptor: &str) -> String {
    if descriptor.is_empty() {
        return DEFAULT_SESSION.to_string();
    }
    format!("{}{:08x}", SESSION_PREFIX, hash32(descriptor.as_bytes()))
}

/// Stable hash of a `(window, screen)` pair, used to break screen-assignment
/// ties deterministically across recomputes and across processes.
pub fn pair_hash(window_id: &str, screen_id: &str) -> u32 {
    let mut bytes = Vec::with_capacity(window_id.len() + screen_id.len() + 1);
    bytes.extend_from_slice(window_id.as_bytes());
    bytes.push(0);
    bytes.extend_from_slice(screen_id.as_bytes());
    hash32(&bytes)
}
