//! RON storage for Voronoi settings presets.

pub mod settings_io;

pub use settings_io::{
    load_settings, load_settings_or_default, save_settings, PresetStore, SettingsIoError, DEFAULT_PRESET_DIR,
};
