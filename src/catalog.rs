//! Asset catalog extraction from the platform's embed page.
//!
//! The embed endpoint returns markup, not an API payload. Somewhere in an
//! inline script sits a JSON object with an `"assets": [...]` member listing
//! every encoding of the video. We locate that member and decode the array
//! in place, stopping at its closing bracket, so the rest of the page can
//! change freely.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::resolution::Resolution;

static ASSETS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""assets"\s*:\s*\["#).expect("valid regex"));

/// One encoding of a video: a pixel height and where to fetch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetVariant {
    /// Height in pixels.
    pub height: u32,
    /// Direct URL of the encoded file.
    pub url: String,
}

impl AssetVariant {
    /// Reads a variant from one element of the asset array.
    ///
    /// Elements without a positive whole-number height or a non-empty URL
    /// are not video encodings and yield `None`.
    fn from_value(value: &Value) -> Option<Self> {
        let height = value.get("height").and_then(height_of)?;
        let url = value.get("url").and_then(Value::as_str)?;
        if url.is_empty() {
            return None;
        }
        Some(Self {
            height,
            url: url.to_string(),
        })
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn height_of(value: &Value) -> Option<u32> {
    let height = value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|h| h.fract() == 0.0 && (1.0..=f64::from(u32::MAX)).contains(h))
            .map(|h| h as u64)
    })?;
    u32::try_from(height).ok().filter(|h| *h > 0)
}

/// The quality variants available for one video identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    variants: Vec<AssetVariant>,
}

impl Catalog {
    /// Creates a catalog from variants in discovery order.
    #[must_use]
    pub const fn new(variants: Vec<AssetVariant>) -> Self {
        Self { variants }
    }

    /// Variants in the order the platform listed them.
    #[must_use]
    pub fn variants(&self) -> &[AssetVariant] {
        &self.variants
    }

    /// Returns true if no usable variant was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Distinct heights present, highest first.
    #[must_use]
    pub fn resolutions(&self) -> Vec<Resolution> {
        let mut heights: Vec<u32> = self.variants.iter().map(|v| v.height).collect();
        heights.sort_unstable_by(|a, b| b.cmp(a));
        heights.dedup();
        heights.into_iter().map(Resolution::new).collect()
    }
}

/// Extracts the asset catalog embedded in an embed page body.
///
/// Elements that are not usable video encodings (thumbnails, captions,
/// entries with odd field types) are dropped one by one; they never spoil
/// the rest of the array.
///
/// # Errors
///
/// Returns [`Error::CatalogNotFound`] if the page has no `"assets"` array and
/// [`Error::MalformedCatalog`] if the array itself does not decode.
pub fn extract_catalog(body: &str) -> Result<Catalog> {
    let marker = ASSETS_RE.find(body).ok_or(Error::CatalogNotFound)?;
    // The match ends just past the opening bracket.
    let fragment = &body[marker.end() - 1..];

    let raw: Vec<Value> = serde_json::Deserializer::from_str(fragment)
        .into_iter::<Vec<Value>>()
        .next()
        .ok_or(Error::CatalogNotFound)?
        .map_err(Error::MalformedCatalog)?;

    Ok(Catalog::new(
        raw.iter().filter_map(AssetVariant::from_value).collect(),
    ))
}
