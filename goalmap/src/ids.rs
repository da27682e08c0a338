use std::collections::HashSet;

use crate::error::MutationError;
use crate::limits::MAX_ID_ATTEMPTS;

/// Source of fresh node, edge and map ids
pub trait IdGenerator {
    fn new_id(&mut self) -> String;
}

/// Random v4 UUIDs
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn new_id(&mut self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// `prefix-1`, `prefix-2`, ... for reproducible ids in tests and demos
#[derive(Clone, Debug)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        SequentialIds {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl IdGenerator for SequentialIds {
    fn new_id(&mut self) -> String {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

impl<F: FnMut() -> String> IdGenerator for F {
    fn new_id(&mut self) -> String {
        self()
    }
}

/// Draw ids until one is not in `taken`, then reserve it
pub(crate) fn fresh_id(
    ids: &mut dyn IdGenerator,
    taken: &mut HashSet<String>,
) -> Result<String, MutationError> {
    for _ in 0..MAX_ID_ATTEMPTS {
        let id = ids.new_id();
        if taken.insert(id.clone()) {
            return Ok(id);
        }
        log::warn!("id generator produced taken id {id}, retrying");
    }
    Err(MutationError::IdExhausted {
        attempts: MAX_ID_ATTEMPTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids() {
        let mut ids = SequentialIds::new("n");
        assert_eq!(ids.new_id(), "n-1");
        assert_eq!(ids.new_id(), "n-2");
    }

    #[test]
    fn test_uuid_ids_are_distinct() {
        let mut ids = UuidIds;
        assert_ne!(ids.new_id(), ids.new_id());
    }

    #[test]
    fn test_fresh_id_skips_taken() {
        let mut seq = SequentialIds::new("n");
        let mut taken: HashSet<String> = ["n-1".to_string(), "n-2".to_string()].into();
        assert_eq!(fresh_id(&mut seq, &mut taken).unwrap(), "n-3");
        assert!(taken.contains("n-3"));
    }

    #[test]
    fn test_fresh_id_gives_up_on_constant_generator() {
        let mut constant = || "same".to_string();
        let mut taken: HashSet<String> = ["same".to_string()].into();
        assert_eq!(
            fresh_id(&mut constant, &mut taken),
            Err(MutationError::IdExhausted {
                attempts: MAX_ID_ATTEMPTS
            })
        );
    }
}
