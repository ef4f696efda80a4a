//! Parameter binding - resolves per-step templates against the run context

use crate::core::config::{ConfigError, ParameterTemplate, ParameterTemplates};
use crate::core::context::ExecutionContext;
use crate::steps::StepError;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Escapes (`{{`, `}}`), placeholders (`{name}`) and stray braces
fn template_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{|\}\}|\{([^{}]*)\}|[{}]").expect("template pattern is a valid regex")
    })
}

/// Render one template string
///
/// Errors carry only the offending placeholder or message; the caller
/// attaches step and parameter names.
fn render(template: &str, context: &ExecutionContext) -> Result<String, TemplateError> {
    let mut rendered = String::with_capacity(template.len());
    let mut last = 0;

    for caps in template_pattern().captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        rendered.push_str(&template[last..whole.start()]);
        last = whole.end();

        match whole.as_str() {
            "{{" => rendered.push('{'),
            "}}" => rendered.push('}'),
            "{" | "}" => {
                return Err(TemplateError::Malformed(format!(
                    "unbalanced '{}' at offset {}",
                    whole.as_str(),
                    whole.start()
                )))
            }
            _ => {
                let name = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
                match context.lookup(name) {
                    Some(value) => rendered.push_str(value),
                    None => return Err(TemplateError::Unknown(name.to_string())),
                }
            }
        }
    }

    rendered.push_str(&template[last..]);
    Ok(rendered)
}

enum TemplateError {
    Unknown(String),
    Malformed(String),
}

/// Concrete, call-time arguments for one step
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StepParams(BTreeMap<String, Value>);

impl StepParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// A required string parameter
    pub fn require_str(&self, name: &str) -> Result<&str, StepError> {
        self.optional_str(name)?
            .ok_or_else(|| StepError::MissingParameter(name.to_string()))
    }

    /// An optional string parameter; null counts as absent
    pub fn optional_str(&self, name: &str) -> Result<Option<&str>, StepError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(StepError::InvalidParameter {
                name: name.to_string(),
                expected: "a string",
            }),
        }
    }

    /// A non-negative integer, given as a number or a numeric string
    pub fn u64_or(&self, name: &str, default: u64) -> Result<u64, StepError> {
        let invalid = || StepError::InvalidParameter {
            name: name.to_string(),
            expected: "a non-negative integer",
        };
        match self.get(name) {
            None => Ok(default),
            Some(Value::Number(n)) => n.as_u64().ok_or_else(invalid),
            Some(Value::String(s)) => s.trim().parse().map_err(|_| invalid()),
            Some(_) => Err(invalid()),
        }
    }

    /// A list of strings; a single string counts as a one-element list
    pub fn str_list(&self, name: &str) -> Result<Vec<String>, StepError> {
        let invalid = || StepError::InvalidParameter {
            name: name.to_string(),
            expected: "a string or a list of strings",
        };
        match self.get(name) {
            None => Ok(Vec::new()),
            Some(Value::String(s)) => Ok(vec![s.clone()]),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
                .collect(),
            Some(_) => Err(invalid()),
        }
    }
}

/// Resolves a step's declared parameters against the run's context
#[derive(Debug, Clone, Default)]
pub struct ParameterBinder {
    templates: ParameterTemplates,
}

impl ParameterBinder {
    pub fn new(templates: ParameterTemplates) -> Self {
        Self { templates }
    }

    /// The declared template for a step, if any
    pub fn template(&self, step: &str) -> Option<&ParameterTemplate> {
        self.templates.get(step)
    }

    /// Resolve the arguments for `step`
    ///
    /// A step without a template resolves to no arguments. Only top-level
    /// string values are rendered; numbers, booleans, lists and mappings
    /// pass through unchanged.
    pub fn resolve(&self, step: &str, context: &ExecutionContext) -> Result<StepParams, ConfigError> {
        let Some(template) = self.templates.get(step) else {
            return Ok(StepParams::new());
        };

        let mut resolved = BTreeMap::new();
        for (name, value) in template.iter() {
            let value = match value {
                Value::String(raw) => {
                    Value::String(render(raw, context).map_err(|e| match e {
                        TemplateError::Unknown(placeholder) => ConfigError::UnknownPlaceholder {
                            step: step.to_string(),
                            parameter: name.clone(),
                            placeholder,
                        },
                        TemplateError::Malformed(message) => ConfigError::MalformedTemplate {
                            step: step.to_string(),
                            parameter: name.clone(),
                            message,
                        },
                    })?)
                }
                other => other.clone(),
            };
            resolved.insert(name.clone(), value);
        }

        Ok(StepParams(resolved))
    }
}
