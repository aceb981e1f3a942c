//! Built-in attribute validators
//!
//! Validators only see known, non-null values; the protocol service skips
//! null and unknown values before calling them.

use crate::schema::{Validator, ValidatorRequest, ValidatorResponse};
use crate::types::{Diagnostic, Dynamic};
use regex::Regex;

pub struct StringLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl StringLengthValidator {
    pub fn at_least(min: usize) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn at_most(max: usize) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub fn between(min: usize, max: usize) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }
}

impl Validator for StringLengthValidator {
    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("string length must be between {} and {}", min, max),
            (Some(min), None) => format!("string length must be at least {}", min),
            (None, Some(max)) => format!("string length must be at most {}", max),
            (None, None) => "string of any length".to_string(),
        }
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut diagnostics = vec![];
        if let Some(s) = request.value.as_string() {
            let len = s.chars().count();
            if let Some(min) = self.min {
                if len < min {
                    diagnostics.push(
                        Diagnostic::error(
                            format!("{} must have minimum length of {}", request.path, min),
                            format!("Got length {}", len),
                        )
                        .with_attribute(request.path.clone()),
                    );
                }
            }
            if let Some(max) = self.max {
                if len > max {
                    diagnostics.push(
                        Diagnostic::error(
                            format!("{} must have maximum length of {}", request.path, max),
                            format!("Got length {}", len),
                        )
                        .with_attribute(request.path.clone()),
                    );
                }
            }
        }
        ValidatorResponse { diagnostics }
    }
}

pub struct StringPatternValidator {
    pub pattern: Regex,
    pub description: String,
}

impl StringPatternValidator {
    /// Fails when the pattern itself does not compile
    pub fn new(pattern: &str, description: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            description: description.to_string(),
        })
    }
}

impl Validator for StringPatternValidator {
    fn description(&self) -> String {
        format!("value must match {}", self.description)
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut diagnostics = vec![];
        if let Some(s) = request.value.as_string() {
            if !self.pattern.is_match(s) {
                diagnostics.push(
                    Diagnostic::error(
                        format!("{} must match {}", request.path, self.description),
                        format!("Value '{}' does not match pattern {}", s, self.pattern),
                    )
                    .with_attribute(request.path.clone()),
                );
            }
        }
        ValidatorResponse { diagnostics }
    }
}

pub struct StringOneOfValidator {
    pub allowed: Vec<String>,
}

impl StringOneOfValidator {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }
}

impl Validator for StringOneOfValidator {
    fn description(&self) -> String {
        format!("value must be one of: {}", self.allowed.join(", "))
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut diagnostics = vec![];
        if let Some(s) = request.value.as_string() {
            if !self.allowed.iter().any(|allowed| allowed == s) {
                diagnostics.push(
                    Diagnostic::error(
                        format!("Invalid value for {}", request.path),
                        format!(
                            "Got '{}', expected one of: {}",
                            s,
                            self.allowed.join(", ")
                        ),
                    )
                    .with_attribute(request.path.clone()),
                );
            }
        }
        ValidatorResponse { diagnostics }
    }
}

pub struct NumberRangeValidator {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumberRangeValidator {
    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }
}

impl Validator for NumberRangeValidator {
    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("value must be between {} and {}", min, max),
            (Some(min), None) => format!("value must be at least {}", min),
            (None, Some(max)) => format!("value must be at most {}", max),
            (None, None) => "any number".to_string(),
        }
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut diagnostics = vec![];
        if let Some(n) = request.value.as_number() {
            if let Some(min) = self.min {
                if n < min {
                    diagnostics.push(
                        Diagnostic::error(
                            format!("{} must be at least {}", request.path, min),
                            format!("Got {}", n),
                        )
                        .with_attribute(request.path.clone()),
                    );
                }
            }
            if let Some(max) = self.max {
                if n > max {
                    diagnostics.push(
                        Diagnostic::error(
                            format!("{} must be at most {}", request.path, max),
                            format!("Got {}", n),
                        )
                        .with_attribute(request.path.clone()),
                    );
                }
            }
        }
        ValidatorResponse { diagnostics }
    }
}

pub struct ListLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl Validator for ListLengthValidator {
    fn description(&self) -> String {
        format!(
            "list must have between {} and {} items",
            self.min.unwrap_or(0),
            self.max.map_or_else(|| "any".to_string(), |m| m.to_string())
        )
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut diagnostics = vec![];
        if let Dynamic::List(items) = &request.value {
            if let Some(min) = self.min {
                if items.len() < min {
                    diagnostics.push(
                        Diagnostic::error(
                            format!("{} must have at least {} items", request.path, min),
                            format!("Got {} items", items.len()),
                        )
                        .with_attribute(request.path.clone()),
                    );
                }
            }
            if let Some(max) = self.max {
                if items.len() > max {
                    diagnostics.push(
                        Diagnostic::error(
                            format!("{} must have at most {} items", request.path, max),
                            format!("Got {} items", items.len()),
                        )
                        .with_attribute(request.path.clone()),
                    );
                }
            }
        }
        ValidatorResponse { diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AttributePath, DiagnosticsExt};

    fn run(validator: &dyn Validator, value: Dynamic) -> Vec<Diagnostic> {
        validator
            .validate(ValidatorRequest {
                value,
                path: AttributePath::new("field"),
            })
            .diagnostics
    }

    #[test]
    fn string_length_validator_accepts_valid_length() {
        let diags = run(&StringLengthValidator::between(3, 10), "hello".into());
        assert!(!diags.has_errors());
    }

    #[test]
    fn string_length_validator_rejects_out_of_range() {
        let diags = run(&StringLengthValidator::at_least(5), "hi".into());
        assert_eq!(diags.len(), 1);
        assert!(diags[0].summary.contains("minimum length"));
        assert_eq!(diags[0].attribute, Some(AttributePath::new("field")));

        let diags = run(&StringLengthValidator::at_most(5), "hello world".into());
        assert!(diags[0].summary.contains("maximum length"));
    }

    #[test]
    fn string_pattern_validator() {
        let validator = StringPatternValidator::new(r"^[a-z0-9-]+$", "a lowercase slug").unwrap();
        assert!(run(&validator, "my-tool-1".into()).is_empty());

        let diags = run(&validator, "Not A Slug".into());
        assert_eq!(diags.len(), 1);
        assert!(diags[0].summary.contains("a lowercase slug"));
    }

    #[test]
    fn string_one_of_validator() {
        let validator = StringOneOfValidator::new(["public", "private", "team"]);
        assert!(run(&validator, "team".into()).is_empty());

        let diags = run(&validator, "secret".into());
        assert!(diags.has_errors());
        assert!(diags[0].detail.contains("public, private, team"));
    }

    #[test]
    fn number_range_validator() {
        let validator = NumberRangeValidator::between(1.0, 100.0);
        assert!(run(&validator, Dynamic::Number(50.0)).is_empty());
        assert!(run(&validator, Dynamic::Number(0.0))[0]
            .summary
            .contains("at least"));
        assert!(run(&validator, Dynamic::Number(101.0))[0]
            .summary
            .contains("at most"));
    }

    #[test]
    fn list_length_validator() {
        let validator = ListLengthValidator {
            min: Some(1),
            max: Some(2),
        };
        assert!(run(&validator, Dynamic::List(vec!["a".into()])).is_empty());
        assert_eq!(run(&validator, Dynamic::List(vec![])).len(), 1);
        assert_eq!(
            run(
                &validator,
                Dynamic::List(vec!["a".into(), "b".into(), "c".into()])
            )
            .len(),
            1
        );
    }

    #[test]
    fn validators_ignore_other_types() {
        assert!(run(&StringLengthValidator::at_least(3), Dynamic::Number(1.0)).is_empty());
        assert!(run(&NumberRangeValidator::at_least(3.0), "x".into()).is_empty());
    }
}
