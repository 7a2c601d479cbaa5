use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Setting names that refer to externally owned buffers rather than
/// tunable parameters. They never pass through the generic set path and
/// are stripped from settings snapshots.
pub const EXCLUDED_FIELDS: [&str; 4] = [
    "count_data",
    "fast_counter_settings",
    "sampling_information",
    "measurement_settings",
];

/// The durable extraction state: the selected method plus the tunable
/// parameters shared by the stock extraction methods. Settings written
/// under a name with no typed field here land in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSettings {
    pub method: String,
    pub conv_std_dev: f64,
    pub count_threshold: u32,
    pub min_laser_length: f64,
    pub threshold_tolerance: f64,
    #[serde(default)]
    pub extra: serde_json::Map<String, Value>,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            method: "conv_deriv".to_string(),
            conv_std_dev: 20.0,
            count_threshold: 10,
            min_laser_length: 200e-9,
            threshold_tolerance: 20e-9,
            extra: serde_json::Map::new(),
        }
    }
}

impl ExtractionSettings {
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            "conv_std_dev" => Some(Value::from(self.conv_std_dev)),
            "count_threshold" => Some(Value::from(self.count_threshold)),
            "min_laser_length" => Some(Value::from(self.min_laser_length)),
            "threshold_tolerance" => Some(Value::from(self.threshold_tolerance)),
            _ => self.extra.get(name).cloned(),
        }
    }

    /// Writes a typed field, coercing from JSON. `Ok(false)` means the
    /// name has no typed field; `Err` means the value could not be
    /// coerced and the field was left unchanged.
    pub fn set_field(&mut self, name: &str, value: &Value) -> Result<bool, String> {
        match name {
            "conv_std_dev" => {
                self.conv_std_dev = as_f64(name, value)?;
                Ok(true)
            }
            "count_threshold" => {
                self.count_threshold = value
                    .as_u64()
                    .and_then(|raw| u32::try_from(raw).ok())
                    .ok_or_else(|| {
                        format!("Extraction setting '{name}' expects an unsigned integer, got {value}")
                    })?;
                Ok(true)
            }
            "min_laser_length" => {
                self.min_laser_length = as_f64(name, value)?;
                Ok(true)
            }
            "threshold_tolerance" => {
                self.threshold_tolerance = as_f64(name, value)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

fn as_f64(name: &str, value: &Value) -> Result<f64, String> {
    value
        .as_f64()
        .ok_or_else(|| format!("Extraction setting '{name}' expects a number, got {value}"))
}

/// Fast counter configuration supplied by the controlling master module.
/// The extraction core only consults `is_gated`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FastCounterSettings {
    pub is_gated: bool,
    pub bin_width_s: f64,
}

impl Default for FastCounterSettings {
    fn default() -> Self {
        Self {
            is_gated: false,
            bin_width_s: 1e-9,
        }
    }
}
