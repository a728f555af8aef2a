use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse manifest: {0}")]
    ParseJson(#[from] serde_json::Error),
}

/// The subset of a W3C web app manifest that feeds iOS package options.
///
/// Every field is optional: missing values degrade to defaults during
/// option derivation instead of failing here. Unknown members are ignored.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default)]
    pub icons: Vec<ManifestIcon>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_color: Option<String>,
    /// Where the manifest was fetched from. Not a manifest member; attached
    /// by the loader and used as the base for relative URLs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ManifestIcon {
    pub src: String,
    /// Space-separated `WxH` pairs, e.g. `"192x192 512x512"`, or `"any"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

impl ManifestIcon {
    /// Every `(width, height)` pair declared in `sizes`, in declaration order.
    /// Entries that are not `WxH` pairs (such as `any`) are skipped.
    pub fn sizes(&self) -> Vec<(u32, u32)> {
        let Some(sizes) = self.sizes.as_deref() else {
            return Vec::new();
        };
        sizes
            .split_whitespace()
            .filter_map(|pair| {
                let (w, h) = pair.split_once(['x', 'X'])?;
                Some((w.parse().ok()?, h.parse().ok()?))
            })
            .collect()
    }

    /// Largest declared size, by area, among pairs whose width and height
    /// both reach `min_edge`.
    pub fn largest_size_at_least(&self, min_edge: u32) -> Option<(u32, u32)> {
        self.sizes()
            .into_iter()
            .filter(|(w, h)| *w >= min_edge && *h >= min_edge)
            .max_by_key(|(w, h)| u64::from(*w) * u64::from(*h))
    }

    /// PNG-compatible: declared `image/png`, or no declared type and a `.png`
    /// path (query string and fragment ignored).
    pub fn is_png(&self) -> bool {
        match self.mime_type.as_deref() {
            Some(mime) => mime.trim().eq_ignore_ascii_case("image/png"),
            None => {
                let path = self.src.split(['?', '#']).next().unwrap_or_default();
                path.to_ascii_lowercase().ends_with(".png")
            }
        }
    }
}

impl Manifest {
    #[must_use]
    pub fn with_source_url(mut self, url: &str) -> Self {
        self.source_url = Some(url.to_owned());
        self
    }
}

pub fn parse_manifest_str(input: &str) -> Result<Manifest, ManifestError> {
    Ok(serde_json::from_str(input)?)
}

pub fn parse_manifest_file(path: impl AsRef<Path>) -> Result<Manifest, ManifestError> {
    let content = fs::read_to_string(path)?;
    parse_manifest_str(&content)
}
