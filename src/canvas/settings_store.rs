use crate::canvas::settings::CanvasSettings;
use anyhow::{Context, Result};
use std::path::Path;

pub const CANVAS_SETTINGS_FILE_NAME: &str = "canvas_settings.json";

/// Loads settings, or defaults when the file does not exist.
pub fn load_or_default(path: &Path) -> Result<CanvasSettings> {
    Ok(load_from_path(path)?.unwrap_or_default())
}

pub fn load_from_path(path: &Path) -> Result<Option<CanvasSettings>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read canvas settings file {}", path.display()))?;

    if content.trim().is_empty() {
        return Ok(Some(CanvasSettings::default()));
    }

    let mut loaded: CanvasSettings = serde_json::from_str(&content)
        .with_context(|| format!("deserialize canvas settings file {}", path.display()))?;
    if loaded.sanitize() {
        tracing::warn!(path = %path.display(), "canvas settings were out of range and sanitized");
    }
    Ok(Some(loaded))
}

pub fn save_to_path(path: &Path, settings: &CanvasSettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create canvas settings folder {}", parent.display()))?;
    }

    let mut sanitized = settings.clone();
    sanitized.sanitize();
    let json =
        serde_json::to_string_pretty(&sanitized).context("serialize canvas settings")?;
    std::fs::write(path, json)
        .with_context(|| format!("write canvas settings file {}", path.display()))
}
