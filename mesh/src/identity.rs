use std::fmt;

use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

/// Length of generated peer ids.
const PEER_ID_LEN: usize = 16;

/// Identifies one peer process for its lifetime.
///
/// Ids are regenerated on every boot and never persisted, so a restart is
/// observed by the mesh as one peer dying and another joining. Lexicographic
/// order on the id breaks leader-election ties.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    /// Generates a fresh random id.
    pub fn generate() -> Self {
        let id: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(PEER_ID_LEN)
            .map(char::from)
            .collect();
        PeerId(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        PeerId(s.to_string())
    }
}

impl From<String> for PeerId {
    fn from(s: String) -> Self {
        PeerId(s)
    }
}
