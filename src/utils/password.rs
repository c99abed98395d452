use anyhow::{Context, Result};

pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    bcrypt::hash(password, cost).context("Failed to hash password")
}

/// A malformed stored hash is an error, a wrong password is `Ok(false)`.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash).context("Failed to verify password")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[test]
    fn correct_password_verifies() {
        let hash = hash_password("tutoria2024", TEST_COST).unwrap();
        assert!(verify_password("tutoria2024", &hash).unwrap());
        assert!(!verify_password("tutoria2025", &hash).unwrap());
    }

    #[test]
    fn salted_hashes_differ() {
        let a = hash_password("same", TEST_COST).unwrap();
        let b = hash_password("same", TEST_COST).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn garbage_hash_is_an_error() {
        assert!(verify_password("x", "not-a-bcrypt-hash").is_err());
    }
}
