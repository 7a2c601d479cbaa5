use super::channel::{settings_channel, SettingsReceiver, SettingsSnapshot};
use super::types::{ExtractionSettings, FastCounterSettings, EXCLUDED_FIELDS};
use crate::method::{resolve_method_kwargs, MethodRegistry, ModuleState};
use basic_methods::BasicMethods;
use extraction::{CountData, ExtractedPulses, Gating, MethodSource};
use serde_json::Value;
use std::sync::mpsc::Sender;

/// The manager's complete field view: the extraction settings plus the
/// module-owned maps, so a method may declare a parameter named after
/// one of them and receive the whole container.
struct ManagerState<'a> {
    settings: &'a ExtractionSettings,
    fast_counter_settings: &'a FastCounterSettings,
    sampling_information: &'a serde_json::Map<String, Value>,
    measurement_settings: &'a serde_json::Map<String, Value>,
}

impl ModuleState for ManagerState<'_> {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "fast_counter_settings" => serde_json::to_value(self.fast_counter_settings).ok(),
            "sampling_information" => Some(Value::Object(self.sampling_information.clone())),
            "measurement_settings" => Some(Value::Object(self.measurement_settings.clone())),
            _ => self.settings.field(name),
        }
    }
}

/// The single mutable point of truth for which extraction method is
/// active and with what parameter values. Synchronous and single-owner;
/// callers needing cross-thread access must serialize externally.
pub struct ExtractionManager {
    registry: MethodRegistry,
    settings: ExtractionSettings,
    pub fast_counter_settings: FastCounterSettings,
    pub sampling_information: serde_json::Map<String, Value>,
    pub measurement_settings: serde_json::Map<String, Value>,
    subscribers: Vec<Sender<SettingsSnapshot>>,
    diagnostics: Vec<String>,
}

impl ExtractionManager {
    pub fn new(sources: &[&dyn MethodSource], settings: ExtractionSettings) -> Self {
        let mut registry = MethodRegistry::discover(sources);
        let diagnostics = registry.take_diagnostics();
        let mut manager = Self {
            registry,
            settings,
            fast_counter_settings: FastCounterSettings::default(),
            sampling_information: serde_json::Map::new(),
            measurement_settings: serde_json::Map::new(),
            subscribers: Vec::new(),
            diagnostics,
        };
        manager.normalize_selection();
        manager
    }

    pub fn with_bundled_methods(settings: ExtractionSettings) -> Self {
        Self::new(&[&BasicMethods as &dyn MethodSource], settings)
    }

    pub fn is_gated(&self) -> bool {
        self.fast_counter_settings.is_gated
    }

    pub fn current_method(&self) -> &str {
        &self.settings.method
    }

    pub fn settings(&self) -> &ExtractionSettings {
        &self.settings
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Names of the methods selectable in the current gating mode.
    pub fn method_names(&self) -> Vec<&str> {
        self.registry.method_names(self.gating())
    }

    pub fn subscribe(&mut self) -> SettingsReceiver {
        let (sender, receiver) = settings_channel();
        self.subscribers.push(sender);
        receiver
    }

    /// The resolved parameter values of the active method, narrowed to
    /// its declared parameters, plus the method name under the reserved
    /// `method` key.
    pub fn get_settings(&mut self) -> SettingsSnapshot {
        let mut snapshot = SettingsSnapshot::new();
        if let Some(method) = self.registry.get(
            Gating::from_is_gated(self.fast_counter_settings.is_gated),
            &self.settings.method,
        ) {
            let state = ManagerState {
                settings: &self.settings,
                fast_counter_settings: &self.fast_counter_settings,
                sampling_information: &self.sampling_information,
                measurement_settings: &self.measurement_settings,
            };
            let kwargs = resolve_method_kwargs(method, &state, &mut self.diagnostics);
            for (name, value) in kwargs {
                if EXCLUDED_FIELDS.contains(&name.as_str()) {
                    continue;
                }
                snapshot.insert(name, value);
            }
        }
        snapshot.insert("method".to_string(), Value::from(self.settings.method.clone()));
        snapshot
    }

    /// Applies a settings mapping. The reserved `method` key selects a
    /// new active method and is rejected when inconsistent with the
    /// current gating mode; unknown names are created dynamically with a
    /// warning. Observers are notified exactly once per call with the
    /// post-update snapshot.
    pub fn set_settings(&mut self, values: &SettingsSnapshot) {
        for (name, value) in values {
            if name == "method" {
                self.apply_method_selection(value);
                continue;
            }
            if EXCLUDED_FIELDS.contains(&name.as_str()) {
                continue;
            }
            match self.settings.set_field(name, value) {
                Ok(true) => {}
                Ok(false) => {
                    let message = format!(
                        "No extraction setting '{name}' exists. Creating it now, but it is \
                         probably not part of any registered extraction method."
                    );
                    log::warn!("{message}");
                    self.diagnostics.push(message);
                    self.settings.extra.insert(name.clone(), value.clone());
                }
                Err(message) => {
                    log::error!("{message}");
                    self.diagnostics.push(message);
                }
            }
        }

        let snapshot = self.get_settings();
        self.subscribers
            .retain(|sender| sender.send(snapshot.clone()).is_ok());
    }

    /// Selects the active method from the map matching the current gating
    /// mode, binds its parameters and invokes it. A gating mismatch of
    /// the buffer is reported but dispatch still proceeds; the selected
    /// method rejects data it cannot handle.
    pub fn extract(&mut self, count_data: &CountData) -> Result<ExtractedPulses, String> {
        let gating = self.gating();
        if count_data.gating() != gating {
            let message = format!(
                "'is_gated' is set to {} but the count data is a {} trace.",
                self.fast_counter_settings.is_gated,
                count_data.gating().label()
            );
            log::error!("{message}");
            self.diagnostics.push(message);
        }
        let Some(method) = self.registry.get(gating, &self.settings.method) else {
            return Err(format!(
                "Extraction method '{}' is not registered for {} data.",
                self.settings.method,
                gating.label()
            ));
        };
        let state = ManagerState {
            settings: &self.settings,
            fast_counter_settings: &self.fast_counter_settings,
            sampling_information: &self.sampling_information,
            measurement_settings: &self.measurement_settings,
        };
        let kwargs = resolve_method_kwargs(method, &state, &mut self.diagnostics);
        (method.func)(count_data, &kwargs).map_err(|err| err.to_string())
    }

    pub fn take_diagnostics(&mut self) -> Vec<String> {
        std::mem::take(&mut self.diagnostics)
    }

    fn gating(&self) -> Gating {
        Gating::from_is_gated(self.fast_counter_settings.is_gated)
    }

    /// A stored selection can be inconsistent with the gating mode of a
    /// new session; fall back to the first registered method then.
    fn normalize_selection(&mut self) {
        let gating = self.gating();
        if self.registry.contains(gating, &self.settings.method) {
            return;
        }
        match self.registry.method_names(gating).first() {
            Some(fallback) => {
                let fallback = fallback.to_string();
                let message = format!(
                    "Stored extraction method '{}' is not registered for {} data. \
                     Falling back to '{}'.",
                    self.settings.method,
                    gating.label(),
                    fallback
                );
                log::warn!("{message}");
                self.diagnostics.push(message);
                self.settings.method = fallback;
            }
            None => {
                let message = format!(
                    "No {} extraction methods are registered; keeping the stored selection '{}'.",
                    gating.label(),
                    self.settings.method
                );
                log::warn!("{message}");
                self.diagnostics.push(message);
            }
        }
    }

    fn apply_method_selection(&mut self, value: &Value) {
        let Some(requested) = value.as_str() else {
            let message = format!("Extraction method selection expects a string, got {value}.");
            log::error!("{message}");
            self.diagnostics.push(message);
            return;
        };
        if self.registry.contains(self.gating(), requested) {
            self.settings.method = requested.to_string();
        } else {
            let message = format!(
                "Extraction method '{}' is not registered for {} data; keeping '{}'.",
                requested,
                self.gating().label(),
                self.settings.method
            );
            log::error!("{message}");
            self.diagnostics.push(message);
        }
    }
}
