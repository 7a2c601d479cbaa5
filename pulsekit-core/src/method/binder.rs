use super::registry::RegisteredMethod;
use crate::settings::ExtractionSettings;
use extraction::ParamMap;
use serde_json::Value;

/// Read-only view of the owning module's named fields, the lookup source
/// for parameter binding. The settings state alone implements it; the
/// façade widens it with its module-owned maps.
pub trait ModuleState {
    fn field(&self, name: &str) -> Option<Value>;
}

impl ModuleState for ExtractionSettings {
    fn field(&self, name: &str) -> Option<Value> {
        ExtractionSettings::field(self, name)
    }
}

/// Resolves the keyword arguments for one method invocation. A module
/// field with the parameter's exact name wins over the declared default;
/// a parameter with neither is left out and the later invocation fails
/// with a missing-argument error.
pub fn resolve_method_kwargs(
    method: &RegisteredMethod,
    state: &impl ModuleState,
    diagnostics: &mut Vec<String>,
) -> ParamMap {
    let mut kwargs = ParamMap::new();
    for spec in &method.params {
        if let Some(value) = state.field(spec.name) {
            kwargs.insert(spec.name.to_string(), value);
        } else if let Some(default) = spec.default {
            let message = format!(
                "Parameter '{}' of extraction method '{}' is not an extraction setting. \
                 Taking the declared default of {} instead.",
                spec.name, method.name, default
            );
            log::warn!("{message}");
            diagnostics.push(message);
            kwargs.insert(spec.name.to_string(), Value::from(default));
        } else {
            let message = format!(
                "Parameter '{}' of extraction method '{}' has neither an extraction setting \
                 nor a declared default; leaving it unresolved.",
                spec.name, method.name
            );
            log::warn!("{message}");
            diagnostics.push(message);
        }
    }
    kwargs
}
