//! Identifier generation for documents inserted without an `_id`.

use bson::oid::ObjectId;
use std::fmt::Debug;
use uuid::Uuid;

/// Produces globally unique, opaque `_id` tokens.
///
/// Implementations must be cheap to call and safe to share between tasks.
pub trait IdGenerator: Send + Sync + Debug {
    /// Returns a new unique token.
    fn generate(&self) -> String;
}

/// Generates 24 character hexadecimal ObjectIds. This is the default generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjectIdGenerator;

impl IdGenerator for ObjectIdGenerator {
    fn generate(&self) -> String {
        ObjectId::new().to_hex()
    }
}

/// Generates random v4 UUIDs in their 32 character simple form.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn object_ids_are_hex_and_unique() {
        let generator = ObjectIdGenerator;
        let ids = (0..100)
            .map(|_| generator.generate())
            .collect::<HashSet<_>>();

        assert_eq!(ids.len(), 100);
        assert!(ids.iter().all(|id| id.len() == 24 && id.chars().all(|c| c.is_ascii_hexdigit())));
    }

    #[test]
    fn uuids_use_the_simple_form() {
        let id = UuidGenerator.generate();
        assert_eq!(id.len(), 32);
        assert!(!id.contains('-'));
    }
}
