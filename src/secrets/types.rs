//! Redacting wrapper for credential values.
//!
//! API and application keys travel through logs, debug output and error
//! messages only as `[REDACTED]` or a masked fingerprint.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Number of trailing characters shown by [`SecretString::fingerprint`]
const FINGERPRINT_SUFFIX: usize = 4;

/// A credential value that never prints itself.
///
/// - `Debug` renders `SecretString([REDACTED])`, `Display` renders `[REDACTED]`
/// - serialization writes `"[REDACTED]"`; deserialization accepts the real value
/// - the buffer is zeroed on drop
///
/// The value is reachable only through [`SecretString::expose_secret`].
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Borrow the underlying value. Never log the result.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Masked form safe for operator output, e.g. `****c0de`.
    ///
    /// Values of eight characters or fewer are fully masked so the suffix
    /// never reveals most of a short secret.
    pub fn fingerprint(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= FINGERPRINT_SUFFIX * 2 {
            return "*".repeat(chars.len().max(FINGERPRINT_SUFFIX));
        }
        let suffix: String = chars[chars.len() - FINGERPRINT_SUFFIX..].iter().collect();
        format!("****{}", suffix)
    }
}

impl Serialize for SecretString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(SecretString)
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SecretString {}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
