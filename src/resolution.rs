//! Resolution labels, the height lookup table, and exact-match selection.

use std::fmt;
use std::str::FromStr;

use crate::catalog::{AssetVariant, Catalog};
use crate::error::{Error, Result};

/// Encoding heights the platform is known to produce, highest first.
///
/// 716 is a real encoding height the platform emits for some uploads.
pub const DEFAULT_HEIGHTS: [u32; 7] = [1080, 720, 716, 540, 480, 360, 220];

/// A video quality identified by its pixel height, written as `720p`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Resolution(u32);

impl Resolution {
    /// Creates a resolution from a pixel height.
    #[must_use]
    pub const fn new(height: u32) -> Self {
        Self(height)
    }

    /// Returns the pixel height.
    #[must_use]
    pub const fn height(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}p", self.0)
    }
}

impl FromStr for Resolution {
    type Err = Error;

    /// Parses the syntax of a label such as `720p`. Whether the height is
    /// selectable is decided by [`ResolutionTable::lookup`].
    fn from_str(label: &str) -> Result<Self> {
        label
            .trim()
            .strip_suffix(['p', 'P'])
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse::<u32>().ok())
            .filter(|&h| h > 0)
            .map(Self)
            .ok_or_else(|| Error::UnknownResolution(label.to_string()))
    }
}

/// The set of selectable resolutions.
///
/// Starts from [`DEFAULT_HEIGHTS`] and can be extended from configuration
/// when the platform starts emitting new encoding heights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionTable {
    /// Always sorted highest first, without duplicates.
    heights: Vec<u32>,
}

impl Default for ResolutionTable {
    fn default() -> Self {
        Self {
            heights: DEFAULT_HEIGHTS.to_vec(),
        }
    }
}

impl ResolutionTable {
    /// Creates the default table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds extra heights to the table.
    #[must_use]
    pub fn with_heights(mut self, extra: impl IntoIterator<Item = u32>) -> Self {
        self.heights.extend(extra.into_iter().filter(|&h| h > 0));
        self.heights.sort_unstable_by(|a, b| b.cmp(a));
        self.heights.dedup();
        self
    }

    /// Maps a label to its resolution if the table knows it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownResolution`] for malformed labels and for
    /// heights missing from the table.
    pub fn lookup(&self, label: &str) -> Result<Resolution> {
        let resolution: Resolution = label.parse()?;
        if self.heights.contains(&resolution.height()) {
            Ok(resolution)
        } else {
            Err(Error::UnknownResolution(label.to_string()))
        }
    }

    /// Returns whether the table contains the given resolution.
    #[must_use]
    pub fn contains(&self, resolution: Resolution) -> bool {
        self.heights.contains(&resolution.height())
    }

    /// The fixed fallback order used when no catalog is available.
    #[must_use]
    pub fn fallback_order(&self) -> Vec<Resolution> {
        self.heights.iter().copied().map(Resolution).collect()
    }
}

/// Picks the asset whose height matches `resolution` exactly.
///
/// The first match in discovery order wins. There is no nearest-height
/// matching.
///
/// # Errors
///
/// Returns [`Error::ResolutionUnavailable`] when no asset has that height.
pub fn select(catalog: &Catalog, resolution: Resolution) -> Result<&AssetVariant> {
    catalog
        .variants()
        .iter()
        .find(|v| v.height == resolution.height())
        .ok_or_else(|| Error::ResolutionUnavailable {
            label: resolution.to_string(),
        })
}
