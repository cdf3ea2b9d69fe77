//! Salted password hashes for user credentials.
//!
//! Only the bcrypt hash of a password is stored. Log-in checks the entered
//! password against that hash.

use bcrypt::{hash, verify};
use serde::{Deserialize, Serialize};

use crate::Error;

/// A bcrypt hash of a user's password, including its salt and cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// The cost used for passwords entered through the registration form.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Salt and hash `raw_password` with `cost` rounds of bcrypt.
    ///
    /// Tests may use the minimum cost of 4 to keep them fast, everything else
    /// should use [PasswordHash::DEFAULT_COST].
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if bcrypt rejects the cost or the password.
    pub fn new(raw_password: &str, cost: u32) -> Result<Self, Error> {
        hash(raw_password, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash read back from the database.
    ///
    /// No check is made that `raw_password_hash` is a bcrypt hash. A malformed
    /// hash makes [PasswordHash::verify] fail rather than succeed.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_owned())
    }

    /// Whether `raw_password` is the password this hash was made from.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if the stored hash is malformed.
    pub fn verify(&self, raw_password: &str) -> Result<bool, Error> {
        verify(raw_password, &self.0).map_err(|error| Error::HashingError(error.to_string()))
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod password_hash_tests {
    use crate::{Error, PasswordHash};

    #[test]
    fn hash_verifies_only_its_own_password() {
        let hash = PasswordHash::new("correct horse battery staple", 4).unwrap();

        assert_eq!(hash.verify("correct horse battery staple"), Ok(true));
        assert_eq!(hash.verify("Correct horse battery staple"), Ok(false));
        assert_eq!(hash.verify(""), Ok(false));
    }

    #[test]
    fn same_password_gets_different_salt() {
        let first = PasswordHash::new("hunter2", 4).unwrap();
        let second = PasswordHash::new("hunter2", 4).unwrap();

        assert_ne!(first, second);
        assert_eq!(second.verify("hunter2"), Ok(true));
    }

    #[test]
    fn hash_is_not_the_raw_password() {
        let hash = PasswordHash::new("hunter2", 4).unwrap();

        assert_ne!(hash.as_ref(), "hunter2");
        assert!(hash.as_ref().starts_with("$2"));
    }

    #[test]
    fn cost_below_minimum_is_rejected() {
        let result = PasswordHash::new("hunter2", 3);

        assert!(matches!(result, Err(Error::HashingError(_))));
    }

    #[test]
    fn malformed_stored_hash_fails_to_verify() {
        let hash = PasswordHash::new_unchecked("hunter2");

        assert!(matches!(hash.verify("hunter2"), Err(Error::HashingError(_))));
    }
}
