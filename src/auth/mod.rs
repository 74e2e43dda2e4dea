use crate::error::AppError;

/// Shared-secret gate in front of the UI. Holds the bcrypt hash of the
/// access password; verification delegates to bcrypt, which compares
/// the full digest rather than exiting early on the first mismatch.
pub struct AccessGate {
    hash: String,
}

impl AccessGate {
    pub fn new(hash: &str) -> Self {
        Self {
            hash: hash.to_string(),
        }
    }

    /// Check a candidate password. A malformed stored hash is reported
    /// as an authentication failure rather than a panic.
    pub fn verify(&self, password: &str) -> Result<bool, AppError> {
        bcrypt::verify(password, &self.hash).map_err(|_| AppError::Auth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Low cost keeps the tests fast; production hashes use DEFAULT_COST
    fn hash(password: &str) -> String {
        bcrypt::hash(password, 4).unwrap()
    }

    #[test]
    fn test_correct_password_grants() {
        let gate = AccessGate::new(&hash("open sesame"));
        assert!(gate.verify("open sesame").unwrap());
    }

    #[test]
    fn test_one_character_off_denies() {
        let gate = AccessGate::new(&hash("open sesame"));
        assert!(!gate.verify("open sesamf").unwrap());
        assert!(!gate.verify("open sesam").unwrap());
        assert!(!gate.verify("").unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        let gate = AccessGate::new("not-a-bcrypt-hash");
        assert!(gate.verify("anything").is_err());
    }
}
