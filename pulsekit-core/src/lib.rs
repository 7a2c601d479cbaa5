pub mod method;
pub mod settings;

pub use method::{resolve_method_kwargs, MethodRegistry, ModuleState, RegisteredMethod};
pub use settings::{
    load_settings_file, normalize_settings, save_settings_file, ExtractionManager,
    ExtractionSettings, FastCounterSettings, NotifyError, SettingsReceiver, SettingsSnapshot,
};
