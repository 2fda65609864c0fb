//! UUID utilities

use uuid::Uuid;

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Parse UUID from string, tolerating surrounding whitespace
pub fn parse(s: &str) -> Result<Uuid, uuid::Error> {
    Uuid::parse_str(s.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_unique() {
        assert_ne!(generate(), generate());
    }

    #[test]
    fn test_parse_roundtrip_and_trim() {
        let id = generate();
        assert_eq!(parse(&format!("  {}\n", id)).unwrap(), id);
        assert!(parse("not-a-uuid").is_err());
    }
}
