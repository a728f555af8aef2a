//! Default iOS package options derived from a web manifest.
//!
//! Derivation is total: every missing or unusable manifest member degrades to a
//! documented default. Colors are passed through as-is; validating them is up
//! to whoever collects user overrides.

use crate::manifest::{Manifest, ManifestIcon};
use serde::{Deserialize, Serialize};
use url::Url;

pub const PLACEHOLDER_APP_NAME: &str = "My Awesome PWA";
pub const PLACEHOLDER_ICON_URL: &str = "https://iospack.dev/assets/placeholder-icon-512.png";
pub const DEFAULT_COLOR: &str = "#FFFFFF";

/// Minimum edge length, in pixels, of an icon usable as the app icon.
const MIN_ICON_EDGE: u32 = 512;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageOptions {
    pub app_name: String,
    pub app_url: String,
    pub icon_url: String,
    pub splash_color: String,
    pub progress_bar_color: String,
    pub status_bar_color: String,
    /// URLs the app may navigate to outside its scope (e.g. sign-in providers).
    #[serde(default)]
    pub permitted_urls: Vec<String>,
}

/// User-supplied replacements for derived defaults. `None` keeps the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageOverrides {
    pub app_name: Option<String>,
    pub app_url: Option<String>,
    pub icon_url: Option<String>,
    pub splash_color: Option<String>,
    pub progress_bar_color: Option<String>,
    pub status_bar_color: Option<String>,
    pub permitted_urls: Option<Vec<String>>,
}

impl PackageOptions {
    #[must_use]
    pub fn apply_overrides(self, overrides: PackageOverrides) -> Self {
        Self {
            app_name: overrides.app_name.unwrap_or(self.app_name),
            app_url: overrides.app_url.unwrap_or(self.app_url),
            icon_url: overrides.icon_url.unwrap_or(self.icon_url),
            splash_color: overrides.splash_color.unwrap_or(self.splash_color),
            progress_bar_color: overrides
                .progress_bar_color
                .unwrap_or(self.progress_bar_color),
            status_bar_color: overrides.status_bar_color.unwrap_or(self.status_bar_color),
            permitted_urls: overrides.permitted_urls.unwrap_or(self.permitted_urls),
        }
    }
}

pub fn derive_package_options(manifest: &Manifest) -> PackageOptions {
    let base = base_origin(manifest);
    let start_url = manifest.start_url.as_deref().unwrap_or("/");

    let app_name = manifest
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(PLACEHOLDER_APP_NAME)
        .to_owned();

    let icon_url = select_icon(&manifest.icons).map_or_else(
        || PLACEHOLDER_ICON_URL.to_owned(),
        |icon| resolve_url(base.as_ref(), &icon.src),
    );

    let background = manifest.background_color.as_deref().unwrap_or(DEFAULT_COLOR);

    PackageOptions {
        app_name,
        app_url: resolve_url(base.as_ref(), start_url),
        icon_url,
        splash_color: background.to_owned(),
        progress_bar_color: manifest
            .theme_color
            .as_deref()
            .unwrap_or(DEFAULT_COLOR)
            .to_owned(),
        status_bar_color: background.to_owned(),
        permitted_urls: Vec::new(),
    }
}

/// Origin root (`scheme://host[:port]/`) of the first absolute, hierarchical
/// URL among the manifest's source location and its scope.
fn base_origin(manifest: &Manifest) -> Option<Url> {
    [manifest.source_url.as_deref(), manifest.scope.as_deref()]
        .into_iter()
        .flatten()
        .filter_map(|candidate| Url::parse(candidate).ok())
        .find(|url| !url.cannot_be_a_base() && url.has_host())
        .and_then(|url| url.join("/").ok())
}

/// Absolute references pass through untouched; relative ones are resolved
/// against `base` when there is one and returned verbatim otherwise.
fn resolve_url(base: Option<&Url>, reference: &str) -> String {
    if Url::parse(reference).is_ok() {
        return reference.to_owned();
    }
    base.and_then(|base| base.join(reference).ok())
        .map_or_else(|| reference.to_owned(), String::from)
}

/// Largest PNG icon whose declared width and height both reach
/// [`MIN_ICON_EDGE`]. Ties keep manifest order.
fn select_icon(icons: &[ManifestIcon]) -> Option<&ManifestIcon> {
    let mut best: Option<(&ManifestIcon, u64)> = None;
    for icon in icons {
        if icon.src.trim().is_empty() || !icon.is_png() {
            continue;
        }
        let Some((w, h)) = icon.largest_size_at_least(MIN_ICON_EDGE) else {
            continue;
        };
        let area = u64::from(w) * u64::from(h);
        if best.map_or(true, |(_, best_area)| area > best_area) {
            best = Some((icon, area));
        }
    }
    best.map(|(icon, _)| icon)
}
