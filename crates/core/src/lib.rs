//! Core business logic for fable.

pub mod services;

pub use services::*;

/// Generate a unique entity ID.
pub fn generate_id() -> String {
    fable_common::IdGenerator::new().generate()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_shape() {
        let id = generate_id();
        assert_eq!(id.len(), 26);
        assert_eq!(id, id.to_lowercase());
    }
}
