// src/utils/token.rs

use rand::RngCore;

/// Bytes of randomness in an attempt token.
const TOKEN_BYTES: usize = 32;

/// 64 lowercase hex characters from the thread-local CSPRNG.
pub fn generate_attempt_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        let token = generate_attempt_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
