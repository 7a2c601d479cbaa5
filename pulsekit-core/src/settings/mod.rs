pub mod channel;
pub mod facade;
pub mod io;
pub mod types;

pub use channel::{NotifyError, SettingsReceiver, SettingsSnapshot};
pub use facade::ExtractionManager;
pub use io::{load_settings_file, normalize_settings, save_settings_file};
pub use types::{ExtractionSettings, FastCounterSettings, EXCLUDED_FIELDS};
