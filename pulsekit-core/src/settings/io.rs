use super::types::ExtractionSettings;
use std::path::Path;

pub fn normalize_settings(mut settings: ExtractionSettings) -> ExtractionSettings {
    settings.conv_std_dev = settings.conv_std_dev.max(1.0);
    settings.min_laser_length = settings.min_laser_length.max(0.0);
    settings.threshold_tolerance = settings.threshold_tolerance.max(0.0);
    settings
}

pub fn load_settings_file(path: &Path) -> Result<ExtractionSettings, String> {
    let data = std::fs::read(path).map_err(|e| {
        format!(
            "Failed to read extraction settings file '{}': {e}",
            path.display()
        )
    })?;
    let settings: ExtractionSettings = serde_json::from_slice(&data).map_err(|e| {
        format!(
            "Failed to parse extraction settings file '{}': {e}",
            path.display()
        )
    })?;
    Ok(normalize_settings(settings))
}

pub fn save_settings_file(path: &Path, settings: &ExtractionSettings) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let data = serde_json::to_vec_pretty(settings)
        .map_err(|e| format!("Failed to serialize extraction settings: {e}"))?;
    std::fs::write(path, data).map_err(|e| {
        format!(
            "Failed to write extraction settings file '{}': {e}",
            path.display()
        )
    })
}
