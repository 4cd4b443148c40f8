//! Typed, named animation options.
//!
//! Hosts edit options as text; the text is coerced to the option's kind and
//! rejected (leaving the value unchanged) when it does not fit.

use std::fmt;

use crate::error::OptionError;

use super::flat::IntoFlat;

#[derive(Debug, Clone, PartialEq)]
pub enum OptionKind {
    Int { low: i64, high: i64 },
    Float { low: f64, high: f64 },
    Bool,
    Str,
    Choice(Vec<String>),
}

impl OptionKind {
    pub fn name(&self) -> &'static str {
        match self {
            OptionKind::Int { .. } => "integer",
            OptionKind::Float { .. } => "float",
            OptionKind::Bool => "boolean",
            OptionKind::Str => "string",
            OptionKind::Choice(_) => "choice",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Int(v) => write!(f, "{v}"),
            OptionValue::Float(v) => write!(f, "{v}"),
            OptionValue::Bool(v) => write!(f, "{v}"),
            OptionValue::Str(v) => f.write_str(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimOption {
    name: String,
    description: String,
    kind: OptionKind,
    default: OptionValue,
    value: OptionValue,
}

impl AnimOption {
    fn with(name: &str, description: &str, kind: OptionKind, default: OptionValue) -> Self {
        AnimOption {
            name: name.to_string(),
            description: description.to_string(),
            kind,
            value: default.clone(),
            default,
        }
    }

    pub fn int(name: &str, description: &str, default: i64, low: i64, high: i64) -> Self {
        let (low, high) = (low.min(high), low.max(high));
        let default = OptionValue::Int(default.clamp(low, high));
        Self::with(name, description, OptionKind::Int { low, high }, default)
    }

    pub fn float(name: &str, description: &str, default: f64, low: f64, high: f64) -> Self {
        let (low, high) = (low.min(high), low.max(high));
        let default = OptionValue::Float(default.clamp(low, high));
        Self::with(name, description, OptionKind::Float { low, high }, default)
    }

    pub fn boolean(name: &str, description: &str, default: bool) -> Self {
        Self::with(name, description, OptionKind::Bool, OptionValue::Bool(default))
    }

    pub fn string(name: &str, description: &str, default: &str) -> Self {
        Self::with(
            name,
            description,
            OptionKind::Str,
            OptionValue::Str(default.to_string()),
        )
    }

    /// An enumerated string option. An unknown default falls back to the
    /// first choice.
    pub fn choice(name: &str, description: &str, default: &str, choices: &[&str]) -> Self {
        let choices: Vec<String> = choices.iter().map(|c| c.to_string()).collect();
        let default = if choices.iter().any(|c| c == default) {
            default.to_string()
        } else {
            choices.first().cloned().unwrap_or_default()
        };
        Self::with(
            name,
            description,
            OptionKind::Choice(choices),
            OptionValue::Str(default),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> &OptionKind {
        &self.kind
    }

    pub fn value(&self) -> &OptionValue {
        &self.value
    }

    pub fn default_value(&self) -> &OptionValue {
        &self.default
    }

    pub fn reset(&mut self) {
        self.value = self.default.clone();
    }

    /// Parse `text` as this option's kind and store it. Returns whether the
    /// value changed.
    pub fn set_text(&mut self, text: &str) -> Result<bool, OptionError> {
        let value = self.coerce(text.trim())?;
        let changed = value != self.value;
        self.value = value;
        Ok(changed)
    }

    fn coerce(&self, text: &str) -> Result<OptionValue, OptionError> {
        let bad = || OptionError::Coercion {
            name: self.name.clone(),
            value: text.to_string(),
            kind: self.kind.name(),
        };
        Ok(match &self.kind {
            OptionKind::Int { low, high } => {
                let v: i64 = match text.parse() {
                    Ok(v) => v,
                    // "3.0" from a float entry still names an integer
                    Err(_) => text
                        .parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(|f| f.round() as i64)
                        .ok_or_else(bad)?,
                };
                OptionValue::Int(v.clamp(*low, *high))
            }
            OptionKind::Float { low, high } => {
                let v: f64 = text.parse().map_err(|_| bad())?;
                if v.is_nan() {
                    return Err(bad());
                }
                OptionValue::Float(v.clamp(*low, *high))
            }
            OptionKind::Bool => match text.to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => OptionValue::Bool(true),
                "false" | "no" | "off" | "0" => OptionValue::Bool(false),
                _ => return Err(bad()),
            },
            OptionKind::Str => OptionValue::Str(text.to_string()),
            OptionKind::Choice(choices) => {
                if !choices.iter().any(|c| c == text) {
                    return Err(OptionError::NotAChoice {
                        name: self.name.clone(),
                        value: text.to_string(),
                        choices: choices.clone(),
                    });
                }
                OptionValue::Str(text.to_string())
            }
        })
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.value {
            OptionValue::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Floats, and integers widened to float.
    pub fn as_float(&self) -> Option<f64> {
        match self.value {
            OptionValue::Float(v) => Some(v),
            OptionValue::Int(v) => Some(v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.value {
            OptionValue::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            OptionValue::Str(v) => Some(v),
            _ => None,
        }
    }
}

impl IntoFlat<AnimOption> for AnimOption {
    fn flatten_into(self, out: &mut Vec<AnimOption>) {
        out.push(self);
    }
}

#[derive(Debug, Clone, Default)]
pub struct OptionSet {
    options: Vec<AnimOption>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, options: impl IntoFlat<AnimOption>) {
        options.flatten_into(&mut self.options);
    }

    pub fn get(&self, name: &str) -> Option<&AnimOption> {
        self.options.iter().find(|o| o.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut AnimOption> {
        self.options.iter_mut().find(|o| o.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnimOption> {
        self.options.iter()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Restore every default.
    pub fn reset(&mut self) {
        for option in &mut self.options {
            option.reset();
        }
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name)?.as_int()
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        self.get(name)?.as_float()
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name)?.as_bool()
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name)?.as_str()
    }
}
