use std::fs;
use std::path::{Path, PathBuf};
use ts_voronoi::{VoronoiError, VoronoiSettings};

/// Where presets live when no other directory is given.
pub const DEFAULT_PRESET_DIR: &str = "assets/voronoi";

const PRESET_EXTENSION: &str = "ron";

/// Error type for reading and writing settings files.
#[derive(Debug)]
pub enum SettingsIoError {
    Io(std::io::Error),
    Serialize(ron::Error),
    Parse(ron::error::SpannedError),
    Invalid(VoronoiError),
}

impl From<std::io::Error> for SettingsIoError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ron::Error> for SettingsIoError {
    fn from(err: ron::Error) -> Self {
        Self::Serialize(err)
    }
}

impl From<ron::error::SpannedError> for SettingsIoError {
    fn from(err: ron::error::SpannedError) -> Self {
        Self::Parse(err)
    }
}

impl From<VoronoiError> for SettingsIoError {
    fn from(err: VoronoiError) -> Self {
        Self::Invalid(err)
    }
}

impl std::fmt::Display for SettingsIoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "settings file I/O failed: {}", e),
            Self::Serialize(e) => write!(f, "could not encode settings: {}", e),
            Self::Parse(e) => write!(f, "could not parse settings: {}", e),
            Self::Invalid(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SettingsIoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Serialize(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Invalid(e) => Some(e),
        }
    }
}

/// Write `settings` to `path` as pretty RON, creating parent directories.
///
/// Settings are validated first so a bad configuration never reaches disk.
pub fn save_settings(path: &Path, settings: &VoronoiSettings) -> Result<(), SettingsIoError> {
    settings.validate()?;

    let pretty = ron::ser::PrettyConfig::new().depth_limit(3);
    let text = ron::ser::to_string_pretty(settings, pretty)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    Ok(())
}

/// Read and validate settings from a RON file.
pub fn load_settings(path: &Path) -> Result<VoronoiSettings, SettingsIoError> {
    let text = fs::read_to_string(path)?;
    let settings: VoronoiSettings = ron::from_str(&text)?;
    settings.validate()?;
    Ok(settings)
}

/// Like [`load_settings`], but a missing file yields the default settings.
pub fn load_settings_or_default(path: &Path) -> Result<VoronoiSettings, SettingsIoError> {
    match load_settings(path) {
        Err(SettingsIoError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            Ok(VoronoiSettings::default())
        }
        other => other,
    }
}

/// A directory of named settings presets, one RON file per preset.
///
/// Preset names are free text; they map to lowercase file stems with
/// anything other than letters, digits, `-` and `_` replaced by `_`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetStore {
    root: PathBuf,
}

impl Default for PresetStore {
    fn default() -> Self {
        Self::new(DEFAULT_PRESET_DIR)
    }
}

impl PresetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File that holds the preset called `name`.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(preset_file_name(name))
    }

    /// Save `settings` under `name`, returning the file written.
    pub fn save(&self, name: &str, settings: &VoronoiSettings) -> Result<PathBuf, SettingsIoError> {
        let path = self.path_for(name);
        save_settings(&path, settings)?;
        Ok(path)
    }

    /// Load the preset called `name`; an unknown preset yields defaults.
    pub fn load_or_default(&self, name: &str) -> Result<VoronoiSettings, SettingsIoError> {
        load_settings_or_default(&self.path_for(name))
    }

    /// File stems of the stored presets, sorted. A missing directory holds
    /// no presets.
    pub fn names(&self) -> Result<Vec<String>, std::io::Error> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some(PRESET_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

fn preset_file_name(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| match c {
            c if c.is_alphanumeric() => c.to_ascii_lowercase(),
            '-' | '_' => c,
            _ => '_',
        })
        .collect();
    format!("{}.{}", stem, PRESET_EXTENSION)
}
