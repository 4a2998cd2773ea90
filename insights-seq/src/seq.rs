//! Validated nucleotide sequence type.
//!
//! [`DnaSequence`] is a newtype over `Vec<u8>`. Construction uppercases and
//! validates every byte, so `Deref<Target=[u8]>` and `as_bytes()` always see
//! uppercase `ACGTN` and can be handed to any `&[u8]` API.

use std::fmt;
use std::ops::Deref;

use insights_core::{InsightsError, Sequence, Summarizable};

use crate::alphabet::DnaAlphabet;

/// A validated, uppercase DNA sequence.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DnaSequence {
    data: Vec<u8>,
}

impl DnaSequence {
    /// Create a new validated sequence from raw bytes.
    ///
    /// Input is uppercased, then every byte is checked against
    /// [`DnaAlphabet`].
    pub fn new(bytes: impl AsRef<[u8]>) -> insights_core::Result<Self> {
        let data: Vec<u8> = bytes.as_ref().iter().map(|b| b.to_ascii_uppercase()).collect();
        if let Some(i) = data.iter().position(|&b| !DnaAlphabet::is_valid(b)) {
            let b = data[i];
            return Err(InsightsError::InvalidInput(format!(
                "invalid {} byte '{}' (0x{:02X}) at position {}",
                DnaAlphabet::NAME,
                b.escape_ascii(),
                b,
                i
            )));
        }
        Ok(Self { data })
    }

    /// Wrap bytes that are already uppercase members of the alphabet.
    pub(crate) fn from_validated(data: Vec<u8>) -> Self {
        debug_assert!(data.iter().all(|&b| DnaAlphabet::is_valid(b)));
        Self { data }
    }

    /// The sequence as a `&str`. Always valid ASCII.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.data).unwrap_or_default()
    }
}

impl Deref for DnaSequence {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl AsRef<[u8]> for DnaSequence {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl Sequence for DnaSequence {
    fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Summarizable for DnaSequence {
    fn summary(&self) -> String {
        let preview_len = self.data.len().min(20);
        let preview = &self.as_str()[..preview_len];
        if self.data.len() > 20 {
            format!("DNA sequence ({} bp): {}...", self.data.len(), preview)
        } else {
            format!("DNA sequence ({} bp): {}", self.data.len(), preview)
        }
    }
}

impl fmt::Debug for DnaSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DNA(\"{}\")", self.as_str())
    }
}

impl fmt::Display for DnaSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for DnaSequence {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for DnaSequence {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s.as_bytes()).map_err(serde::de::Error::custom)
    }
}
