//! Step configuration files
//!
//! Two independent descriptors drive a deployment:
//!
//! - the step implementation map (`step name -> implementation id`)
//! - the step parameter map (`step name -> { parameter -> value or template }`)
//!
//! Files ending in `.yaml`/`.yml` are parsed as YAML, everything else as JSON.
//! A missing or broken file never aborts loading: it yields an empty mapping
//! and a [`ConfigError`] for the caller to report. A single bad entry is
//! skipped and reported while the rest of its file still loads.

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default file name of the step implementation map
pub const DEFAULT_STEPS_FILE: &str = "steps_config.json";

/// Default file name of the step parameter map
pub const DEFAULT_PARAMS_FILE: &str = "step_parameters.json";

/// Configuration problems. None of these abort a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read configuration file {}: {message}", path.display())]
    Unreadable { path: PathBuf, message: String },

    #[error("Malformed configuration file {}: {message}", path.display())]
    Malformed { path: PathBuf, message: String },

    #[error("Invalid entry '{step}' in {}: {message}", path.display())]
    InvalidEntry {
        path: PathBuf,
        step: String,
        message: String,
    },

    #[error("Step '{step}' is registered more than once (implementation '{implementation}' ignored)")]
    DuplicateStep { step: String, implementation: String },

    #[error("Step '{step}' refers to unknown implementation '{implementation}'")]
    UnknownImplementation { step: String, implementation: String },

    #[error("Step '{step}' parameter '{parameter}' uses unknown placeholder '{{{placeholder}}}'")]
    UnknownPlaceholder {
        step: String,
        parameter: String,
        placeholder: String,
    },

    #[error("Step '{step}' parameter '{parameter}' has a malformed template: {message}")]
    MalformedTemplate {
        step: String,
        parameter: String,
        message: String,
    },
}

/// Serialization format of a configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Pick the format from the file extension
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                ConfigFormat::Yaml
            }
            _ => ConfigFormat::Json,
        }
    }

    fn parse<T: serde::de::DeserializeOwned>(self, content: &str) -> Result<T, String> {
        match self {
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

/// Locations of the two configuration files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigPaths {
    pub steps: PathBuf,
    pub parameters: PathBuf,
}

impl ConfigPaths {
    pub fn new(steps: impl Into<PathBuf>, parameters: impl Into<PathBuf>) -> Self {
        Self {
            steps: steps.into(),
            parameters: parameters.into(),
        }
    }

    /// Default locations: `./config/<file>`, falling back to the per-user
    /// config directory when the local file does not exist
    pub fn discover() -> Self {
        Self {
            steps: locate(DEFAULT_STEPS_FILE),
            parameters: locate(DEFAULT_PARAMS_FILE),
        }
    }

    /// Replace either path when an override is given
    pub fn with_overrides(mut self, steps: Option<PathBuf>, parameters: Option<PathBuf>) -> Self {
        if let Some(steps) = steps {
            self.steps = steps;
        }
        if let Some(parameters) = parameters {
            self.parameters = parameters;
        }
        self
    }
}

fn locate(file: &str) -> PathBuf {
    let local = Path::new("config").join(file);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        let user = dir.join("deployflow").join(file);
        if user.exists() {
            return user;
        }
    }
    local
}

fn read_config(path: &Path) -> Result<String, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Top-level entries of a configuration file, in file order
///
/// Values are left untyped here so that one bad entry is reported on its
/// own while the rest of the file still loads.
struct RawEntries(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for RawEntries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RawEntries;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping keyed by step name")
            }

            fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut entries = Vec::new();
                while let Some(entry) = map.next_entry::<String, Value>()? {
                    entries.push(entry);
                }
                Ok(RawEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

fn parse_entries(
    content: &str,
    format: ConfigFormat,
    path: &Path,
) -> Result<Vec<(String, Value)>, ConfigError> {
    format
        .parse::<RawEntries>(content)
        .map(|raw| raw.0)
        .map_err(|message| ConfigError::Malformed {
            path: path.to_path_buf(),
            message,
        })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

/// One `step name -> implementation id` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepBinding {
    pub step: String,
    pub implementation: String,
}

/// The step implementation map, in file order
///
/// Kept as an entry list rather than a map so that duplicate step names
/// survive parsing and can be reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StepBindings(Vec<StepBinding>);

impl StepBindings {
    pub fn new(entries: Vec<StepBinding>) -> Self {
        Self(entries)
    }

    /// Load from a file, along with any entries that had to be skipped
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<(Self, Vec<ConfigError>), ConfigError> {
        let path = path.as_ref();
        let content = read_config(path)?;
        Self::parse(&content, ConfigFormat::from_path(path), path)
    }

    /// Parse file content; `path` is only used for error reporting
    ///
    /// An entry whose implementation id is not a string is skipped and
    /// returned as [`ConfigError::InvalidEntry`].
    pub fn parse(
        content: &str,
        format: ConfigFormat,
        path: &Path,
    ) -> Result<(Self, Vec<ConfigError>), ConfigError> {
        let mut entries = Vec::new();
        let mut errors = Vec::new();

        for (step, value) in parse_entries(content, format, path)? {
            match value {
                Value::String(implementation) => entries.push(StepBinding {
                    step,
                    implementation,
                }),
                other => errors.push(ConfigError::InvalidEntry {
                    path: path.to_path_buf(),
                    step,
                    message: format!("implementation id must be a string, found {}", kind_of(&other)),
                }),
            }
        }

        Ok((Self(entries), errors))
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepBinding> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Declared parameters of one step: literal values or templated strings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterTemplate(BTreeMap<String, Value>);

impl ParameterTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The step parameter map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterTemplates(HashMap<String, ParameterTemplate>);

impl ParameterTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, step: impl Into<String>, template: ParameterTemplate) {
        self.0.insert(step.into(), template);
    }

    /// Load from a file, along with any entries that had to be skipped
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<(Self, Vec<ConfigError>), ConfigError> {
        let path = path.as_ref();
        let content = read_config(path)?;
        Self::parse(&content, ConfigFormat::from_path(path), path)
    }

    /// Parse file content; `path` is only used for error reporting
    ///
    /// A step whose value is not a mapping is skipped and returned as
    /// [`ConfigError::InvalidEntry`]. A null value declares no parameters.
    pub fn parse(
        content: &str,
        format: ConfigFormat,
        path: &Path,
    ) -> Result<(Self, Vec<ConfigError>), ConfigError> {
        let mut templates = Self::new();
        let mut errors = Vec::new();

        for (step, value) in parse_entries(content, format, path)? {
            match value {
                Value::Object(map) => {
                    templates.insert(step, ParameterTemplate(map.into_iter().collect()))
                }
                Value::Null => templates.insert(step, ParameterTemplate::new()),
                other => errors.push(ConfigError::InvalidEntry {
                    path: path.to_path_buf(),
                    step,
                    message: format!("parameters must be a mapping, found {}", kind_of(&other)),
                }),
            }
        }

        Ok((templates, errors))
    }

    pub fn get(&self, step: &str) -> Option<&ParameterTemplate> {
        self.0.get(step)
    }

    /// Step names with their templates, in no particular order
    pub fn steps(&self) -> impl Iterator<Item = (&str, &ParameterTemplate)> {
        self.0.iter().map(|(step, template)| (step.as_str(), template))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Result of loading both configuration files
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub bindings: StepBindings,
    pub parameters: ParameterTemplates,
    /// Problems found while loading, in the order they were found
    pub errors: Vec<ConfigError>,
}

impl LoadedConfig {
    /// Load both files independently; a failure in one does not affect the other
    pub fn load(paths: &ConfigPaths) -> Self {
        let mut errors = Vec::new();

        let bindings = match StepBindings::from_file(&paths.steps) {
            Ok((bindings, skipped)) => {
                errors.extend(skipped);
                bindings
            }
            Err(e) => {
                errors.push(e);
                StepBindings::default()
            }
        };

        let parameters = match ParameterTemplates::from_file(&paths.parameters) {
            Ok((parameters, skipped)) => {
                errors.extend(skipped);
                parameters
            }
            Err(e) => {
                errors.push(e);
                ParameterTemplates::default()
            }
        };

        Self {
            bindings,
            parameters,
            errors,
        }
    }
}
