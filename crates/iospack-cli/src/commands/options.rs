use super::{json_pretty, EXIT_SUCCESS};
use iospack_schema::{derive_package_options, parse_manifest_file, PackageOverrides};
use std::path::Path;

pub fn run(
    manifest_path: &Path,
    manifest_url: Option<&str>,
    overrides: PackageOverrides,
    json: bool,
) -> Result<u8, String> {
    let mut manifest = parse_manifest_file(manifest_path).map_err(|e| e.to_string())?;
    if let Some(url) = manifest_url {
        manifest = manifest.with_source_url(url);
    }
    tracing::debug!(
        "deriving package options from {} ({} icons)",
        manifest_path.display(),
        manifest.icons.len()
    );

    let options = derive_package_options(&manifest).apply_overrides(overrides);

    if json {
        println!("{}", json_pretty(&options)?);
    } else {
        println!("app_name:            {}", options.app_name);
        println!("app_url:             {}", options.app_url);
        println!("icon_url:            {}", options.icon_url);
        println!("splash_color:        {}", options.splash_color);
        println!("progress_bar_color:  {}", options.progress_bar_color);
        println!("status_bar_color:    {}", options.status_bar_color);
        if options.permitted_urls.is_empty() {
            println!("permitted_urls:      (none)");
        } else {
            println!("permitted_urls:      {}", options.permitted_urls.join(", "));
        }
    }
    Ok(EXIT_SUCCESS)
}
