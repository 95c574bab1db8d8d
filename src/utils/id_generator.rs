//! Identifier generation for new entities
//!
//! Repositories never mint ids themselves; they ask an [`IdGenerator`] so
//! tests can swap in predictable ids.

use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random UUID v4 identifiers in hyphenated form
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidV4Generator;

impl IdGenerator for UuidV4Generator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic UUID-shaped identifiers: `00000000-0000-4000-8000-000000000001`, ...
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        format!("00000000-0000-4000-8000-{:012x}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_v4_ids_are_unique_and_parse() {
        let generator = UuidV4Generator;
        let a = generator.generate();
        let b = generator.generate();
        assert_ne!(a, b);
        assert_eq!(Uuid::parse_str(&a).unwrap().get_version_num(), 4);
    }

    #[test]
    fn test_sequential_ids_are_valid_uuids() {
        let generator = SequentialIdGenerator::new();
        assert_eq!(generator.generate(), "00000000-0000-4000-8000-000000000001");
        let second = generator.generate();
        assert_eq!(second, "00000000-0000-4000-8000-000000000002");
        assert!(Uuid::parse_str(&second).is_ok());
    }
}
