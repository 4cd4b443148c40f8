//! Error types for the animator.

/// Errors raised by the geometry graph and the interpolation engine.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum AnimationError {
    /// A point handle does not refer to a live point.
    #[error("Point not found: {id}")]
    PointNotFound { id: String },

    /// An item handle does not refer to a live item.
    #[error("Item not found: {id}")]
    ItemNotFound { id: String },

    /// Adding the user would make a point depend on itself.
    #[error("Cyclic origin: {user} already feeds {point}")]
    CyclicOrigin { point: String, user: String },

    /// The operation needs a different kind of point or item.
    #[error("Wrong kind: expected {expected}, got {actual}")]
    WrongKind {
        expected: &'static str,
        actual: &'static str,
    },

    /// A tween was registered without key values.
    #[error("Tween has no key values")]
    EmptyKeys,
}

/// Errors from editing an option value.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum OptionError {
    /// The text does not parse as the option's type.
    #[error("Option {name}: cannot read {value:?} as {kind}")]
    Coercion {
        name: String,
        value: String,
        kind: &'static str,
    },

    /// The value is not one of the enumerated choices.
    #[error("Option {name}: {value:?} is not one of {choices:?}")]
    NotAChoice {
        name: String,
        value: String,
        choices: Vec<String>,
    },
}

/// An animation definition is missing required parts.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("Invalid animation {name:?}: missing {}", missing.join(", "))]
pub struct ValidationError {
    pub name: String,
    pub missing: Vec<&'static str>,
}

pub type Result<T, E = AnimationError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_missing_part() {
        let err = ValidationError {
            name: String::new(),
            missing: vec!["name", "description", "shots or generate_shots"],
        };
        assert_eq!(
            err.to_string(),
            "Invalid animation \"\": missing name, description, shots or generate_shots"
        );
    }
}
