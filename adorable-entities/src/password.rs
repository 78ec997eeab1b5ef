use std::{fmt, str::FromStr};
use thiserror::Error;

/// A bcrypt password hash.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("The password must have at least {} characters", Password::min_len())]
    TooShort,
    #[error(transparent)]
    Hash(#[from] pwhash::error::Error),
}

impl Password {
    pub const fn min_len() -> usize {
        6
    }

    /// Wrap an already hashed value, e.g. when loading from the database.
    pub const fn from_hash(hash: String) -> Self {
        Self(hash)
    }

    pub fn verify(&self, password: &str) -> bool {
        pwhash::bcrypt::verify(password, &self.0)
    }

    pub fn as_hash(&self) -> &str {
        &self.0
    }
}

impl From<Password> for String {
    fn from(from: Password) -> Self {
        from.0
    }
}

impl FromStr for Password {
    type Err = PasswordError;

    fn from_str(password: &str) -> Result<Self, Self::Err> {
        if password.chars().count() < Password::min_len() {
            return Err(PasswordError::TooShort);
        }
        let res = Self(pwhash::bcrypt::hash(password)?);
        debug_assert!(res.verify(password));
        Ok(res)
    }
}

// Never leak the hash into logs.
impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_hash_and_verify_password() {
        let input = "p^$$w%&7*{}";
        let password = input.parse::<Password>().unwrap();
        assert_ne!(password.as_hash(), input);
        assert!(password.verify(input));
        assert!(!password.verify("something else"));
    }

    #[test]
    fn should_fail_to_parse_short_passwords() {
        for short in ["", "a", "abcde"] {
            assert!(matches!(
                short.parse::<Password>(),
                Err(PasswordError::TooShort)
            ));
        }
    }

    #[test]
    fn debug_output_hides_hash() {
        let password = Password::from_hash("$2b$secret".into());
        assert_eq!("Password(***)", format!("{password:?}"));
    }
}
