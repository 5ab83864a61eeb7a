//! Unique identifier generation for resource names

use anyhow::Result;

/// Produces collision-resistant suffixes for resource names
pub trait GuidGenerator: Send + Sync {
    fn generate(&self) -> Result<String>;
}

/// Random (v4) UUID generator
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl GuidGenerator for UuidGenerator {
    fn generate(&self) -> Result<String> {
        Ok(uuid::Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuids_are_unique() {
        let generator = UuidGenerator;
        let first = generator.generate().unwrap();
        let second = generator.generate().unwrap();

        assert_ne!(first, second);
        assert_eq!(first.len(), 36);
    }
}
