//! Domain identifiers.
//!
//! ULID ベースの ID。いまのところポーリングサイクルの ID だけ（ログの相関用）。

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Identifier of one poll → normalize → deliver → advance run.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CycleId(Ulid);

impl CycleId {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl From<Ulid> for CycleId {
    fn from(ulid: Ulid) -> Self {
        Self(ulid)
    }
}

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cycle-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_id_display_has_prefix() {
        let ulid = Ulid::new();
        let id = CycleId::from_ulid(ulid);
        assert_eq!(id.as_ulid(), ulid);
        assert_eq!(id.to_string(), format!("cycle-{ulid}"));
    }

    #[test]
    fn cycle_ids_sort_by_creation_time() {
        let id1 = CycleId::from_ulid(Ulid::from_parts(1_000, 7));
        let id2 = CycleId::from_ulid(Ulid::from_parts(2_000, 3));
        assert!(id1 < id2);
    }

    #[test]
    fn serializes_as_the_bare_ulid() {
        let ulid = Ulid::from_parts(1_000, 7);
        let json = serde_json::to_string(&CycleId::from_ulid(ulid)).unwrap();
        assert_eq!(json, format!("\"{ulid}\""));
    }
}
