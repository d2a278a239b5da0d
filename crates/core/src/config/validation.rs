use thiserror::Error;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required field: {field}. {hint}")]
    MissingRequired { field: String, hint: String },

    #[error("Invalid value for field '{field}': '{value}'. Expected: {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

impl ConfigError {
    /// Create a missing required field error
    pub fn missing_required(field: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::MissingRequired {
            field: field.into(),
            hint: hint.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }
}

/// Trait for validating configuration values
pub trait ConfigValidator<T> {
    /// Validate a configuration value
    fn validate(&self, value: &T) -> Result<(), ConfigError>;
}

/// Rejects absent, empty and whitespace-only values
pub struct RequiredValidator {
    pub field: &'static str,
    pub hint: String,
}

impl RequiredValidator {
    pub fn new(field: &'static str, hint: impl Into<String>) -> Self {
        Self {
            field,
            hint: hint.into(),
        }
    }
}

impl ConfigValidator<Option<String>> for RequiredValidator {
    fn validate(&self, value: &Option<String>) -> Result<(), ConfigError> {
        match value.as_deref() {
            Some(v) if !v.trim().is_empty() => Ok(()),
            _ => Err(ConfigError::missing_required(self.field, self.hint.clone())),
        }
    }
}

/// Rejects numbers above an inclusive maximum
pub struct MaxValidator {
    pub field: &'static str,
    pub max: u32,
}

impl ConfigValidator<u32> for MaxValidator {
    fn validate(&self, value: &u32) -> Result<(), ConfigError> {
        if *value > self.max {
            return Err(ConfigError::invalid_value(
                self.field,
                value.to_string(),
                format!("at most {}", self.max),
            ));
        }
        Ok(())
    }
}
