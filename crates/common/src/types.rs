use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentinel for an unset 32-bit id (all bits set).
pub const INVALID_ID: u32 = u32::MAX;

/// Returns true if `id` is not the unset sentinel.
pub fn is_valid_id(id: u32) -> bool {
    id != INVALID_ID
}

/// Unique identifier for a scene object, used in diagnostics and inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, enough to tell objects apart in logs.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_uniqueness() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn short_id_is_eight_chars() {
        assert_eq!(ObjectId::new().short().len(), 8);
    }

    #[test]
    fn sentinel_is_all_bits_set() {
        assert_eq!(INVALID_ID, !0u32);
        assert!(!is_valid_id(INVALID_ID));
        assert!(is_valid_id(0));
    }
}
