use rand::{rngs::OsRng, RngCore};

const TOKEN_BYTES: usize = 32;

/// Opaque single-use token for email verification links. Uniqueness is
/// probabilistic; the store backs it with a unique index.
pub fn generate_verification_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_64_hex_chars() {
        let token = generate_verification_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn tokens_do_not_repeat() {
        assert_ne!(generate_verification_token(), generate_verification_token());
    }
}
