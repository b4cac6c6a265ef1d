//! Card credentials and the allow-list they are matched against.
//!
//! A [`Credential`] is the UID a tag reader hands back for the card in the
//! field. It is compared byte for byte against every entry of an
//! [`AllowList`] loaded from configuration at startup.
//!
//! # Example
//!
//! ```rust
//! use rs_doorlock::credential::{AllowList, Credential};
//!
//! let allow = AllowList::new(&[[0xAB, 0xCD, 0xEF, 0x00]]).unwrap();
//!
//! assert!(allow.is_valid(&Credential::from_slice(&[0xAB, 0xCD, 0xEF, 0x00])));
//! assert!(!allow.is_valid(&Credential::from_slice(&[0xAB, 0xCD, 0xEF, 0x01])));
//! ```

use core::fmt::Write;

use heapless::{String as HString, Vec as HVec};

use crate::config::ConfigError;

/// Number of UID bytes compared by the matcher.
///
/// Most MIFARE Classic tags report a 4-byte NUID, which is what the
/// allow-list stores.
pub const UID_SIZE: usize = 4;

/// Longest UID a reader can report (ISO 14443-3 triple size UID).
pub const MAX_UID_LEN: usize = 10;

/// Maximum number of allow-list entries.
pub const MAX_ALLOWED_CARDS: usize = 16;

/// Buffer size of the hex rendering: `MAX_UID_LEN` pairs plus separators.
pub const HEX_LEN: usize = MAX_UID_LEN * 3;

/// One allow-list entry.
pub type Uid = [u8; UID_SIZE];

/// A UID read from a card.
///
/// Holds whatever length the reader reported; anything other than
/// [`UID_SIZE`] bytes never matches the allow-list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Credential {
    bytes: HVec<u8, MAX_UID_LEN>,
}

impl Credential {
    /// The empty "nothing read yet" credential.
    pub const fn empty() -> Self {
        Self { bytes: HVec::new() }
    }

    /// Build a credential from reader output, keeping at most
    /// [`MAX_UID_LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Self {
        let take = bytes.len().min(MAX_UID_LEN);
        let mut out = HVec::new();
        // Cannot overflow: `take` is bounded by the capacity.
        let _ = out.extend_from_slice(&bytes[..take]);
        Self { bytes: out }
    }

    /// Raw UID bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of UID bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if no bytes were read.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// True for the all-zero pattern a reader leaves behind when no tag
    /// was actually selected. Empty credentials count as blank too.
    pub fn is_blank(&self) -> bool {
        self.bytes.iter().all(|b| *b == 0)
    }

    /// Render as upper-case hex pairs separated by single spaces,
    /// e.g. `"AB CD EF 00"`.
    pub fn to_hex(&self) -> HString<HEX_LEN> {
        let mut out = HString::new();
        for (i, byte) in self.bytes.iter().enumerate() {
            if i > 0 {
                let _ = out.push(' ');
            }
            let _ = write!(out, "{:02X}", byte);
        }
        out
    }
}

impl From<Uid> for Credential {
    fn from(uid: Uid) -> Self {
        Self::from_slice(&uid)
    }
}

/// Immutable set of cards allowed to open the door.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AllowList {
    entries: HVec<Uid, MAX_ALLOWED_CARDS>,
}

impl AllowList {
    /// Build an allow-list from fixed-size UIDs.
    ///
    /// # Errors
    ///
    /// [`ConfigError::EmptyAllowList`] for an empty slice and
    /// [`ConfigError::AllowListFull`] when more than [`MAX_ALLOWED_CARDS`]
    /// entries are given.
    pub fn new(entries: &[Uid]) -> Result<Self, ConfigError> {
        if entries.is_empty() {
            return Err(ConfigError::EmptyAllowList);
        }
        let entries = HVec::from_slice(entries).map_err(|_| ConfigError::AllowListFull {
            capacity: MAX_ALLOWED_CARDS,
        })?;
        Ok(Self { entries })
    }

    /// Build an allow-list from variable-length byte slices, as found in
    /// configuration files.
    ///
    /// # Errors
    ///
    /// Same as [`AllowList::new`], plus [`ConfigError::BadUidLength`] for any
    /// entry that is not exactly [`UID_SIZE`] bytes.
    pub fn from_slices(entries: &[&[u8]]) -> Result<Self, ConfigError> {
        let mut uids: HVec<Uid, MAX_ALLOWED_CARDS> = HVec::new();
        for (index, entry) in entries.iter().enumerate() {
            let uid: Uid = (*entry).try_into().map_err(|_| ConfigError::BadUidLength {
                index,
                len: entry.len(),
            })?;
            uids.push(uid).map_err(|_| ConfigError::AllowListFull {
                capacity: MAX_ALLOWED_CARDS,
            })?;
        }
        Self::new(&uids)
    }

    /// Check a candidate against every entry.
    ///
    /// Each entry is compared across all [`UID_SIZE`] positions before the
    /// result is looked at. This is plain equality, not a constant-time
    /// comparison: the scan still stops at the first matching entry.
    pub fn is_valid(&self, candidate: &Credential) -> bool {
        let Ok(candidate) = <&Uid>::try_from(candidate.as_bytes()) else {
            return false;
        };

        self.entries.iter().any(|entry| {
            entry
                .iter()
                .zip(candidate.iter())
                .fold(true, |same, (a, b)| same & (a == b))
        })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a constructed list; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the entries in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &Uid> {
        self.entries.iter()
    }
}

impl Default for AllowList {
    /// The single demo card shipped in the sample configuration.
    fn default() -> Self {
        let mut entries = HVec::new();
        let _ = entries.push([0xAB, 0xCD, 0xEF, 0x00]);
        Self { entries }
    }
}

/// Free-function form of [`AllowList::is_valid`].
pub fn is_valid(candidate: &Credential, allow_list: &AllowList) -> bool {
    allow_list.is_valid(candidate)
}
