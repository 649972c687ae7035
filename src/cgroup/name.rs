//! Bounded Group Names
//!
//! Names live inline in the group slot; no heap copy is ever made.

use core::fmt;

use crate::error::{Error, Result};

/// Maximum length of a group name in bytes.
pub const MAX_NAME_LEN: usize = 64;

/// A validated, fixed-capacity group name.
///
/// Comparison is byte-wise and therefore case-sensitive.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupName {
    bytes: [u8; MAX_NAME_LEN],
    len: u8,
}

impl GroupName {
    pub(crate) const fn empty() -> Self {
        Self {
            bytes: [0; MAX_NAME_LEN],
            len: 0,
        }
    }

    /// Validate and copy a name.
    ///
    /// Rejected with `InvalidName`:
    /// - empty names
    /// - names longer than `MAX_NAME_LEN` bytes
    /// - names containing `/` or control characters
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(Error::InvalidName);
        }
        if name.chars().any(|c| c == '/' || c.is_control()) {
            return Err(Error::InvalidName);
        }

        let mut out = Self::empty();
        out.bytes[..name.len()].copy_from_slice(name.as_bytes());
        out.len = name.len() as u8;
        Ok(out)
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        // Always built from a whole &str, so the prefix is valid UTF-8.
        core::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or_default()
    }

    /// Length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Never true for a validated name.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl PartialEq<str> for GroupName {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl fmt::Debug for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupName({:?})", self.as_str())
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
