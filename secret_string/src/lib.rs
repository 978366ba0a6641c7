//! A wrapper around strings that hides their contents when printed or
//! formatted for debugging, and wipes its buffer when dropped.
//!
//! It WILL however serialize the value when using [serde](https://serde.rs) serialization/deserialization,
//! since outbound requests need the real value.
//!
//! # Examples
//! ```
//! use secret_string::SecretString;
//! let secret = SecretString::new("my_secret_password");
//! assert_eq!(format!("{}", secret), "******************");
//! assert_eq!(format!("{:?}", secret), "SecretString(******************)");
//! assert_eq!(secret.value(), "my_secret_password");
//! ```

#![deny(warnings)]
#![warn(unused_extern_crates)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unreachable)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::trivially_copy_pass_by_ref)]

use std::fmt::Debug;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// An owned string that never shows up in `Display` or `Debug` output and is
/// zeroed in memory when dropped.
///
/// # Examples
/// ```
/// use secret_string::SecretString;
/// let secret = SecretString::from("hunter2".to_string());
/// assert_eq!(secret.to_string(), "*******");
/// assert!(!secret.is_empty());
/// ```
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(s: impl Into<String>) -> Self {
        SecretString(s.into())
    }

    /// Returns the underlying value.
    pub fn value(&self) -> &str {
        self.0.as_str()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a string of asterisks (*) with the same length as the secret string.
    pub fn as_stars(&self) -> String {
        String::from("*").repeat(self.len())
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        SecretString(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        SecretString(s.to_string())
    }
}

impl std::fmt::Display for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_stars())
    }
}

impl Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretString({})", self.as_stars())
    }
}

impl Zeroize for SecretString {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for SecretString {}

#[cfg(feature = "serde")]
impl serde::Serialize for SecretString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.value())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(Self::new(String::deserialize(deserializer)?))
    }
}
