//! Default values for optional+computed attributes
//!
//! A default is planned when configuration leaves the attribute null. It is
//! ignored for attributes that are not both optional and computed, since
//! Terraform would reject a planned value that differs from configuration.
//!
//! ```no_run
//! use tfplug::defaults::StaticDefault;
//! use tfplug::schema::{AttributeBuilder, AttributeType};
//!
//! let enabled = AttributeBuilder::new("enabled", AttributeType::Bool)
//!     .optional()
//!     .computed()
//!     .default(StaticDefault::bool(true))
//!     .build();
//! ```

use crate::schema::{DefaultRequest, DefaultResponse, DefaultValue};
use crate::types::Dynamic;

/// StaticDefault plans a fixed value
pub struct StaticDefault {
    value: Dynamic,
}

impl StaticDefault {
    pub fn new(value: Dynamic) -> Self {
        Self { value }
    }

    pub fn string(value: &str) -> Self {
        Self::new(Dynamic::String(value.to_string()))
    }

    pub fn number(value: f64) -> Self {
        Self::new(Dynamic::Number(value))
    }

    pub fn bool(value: bool) -> Self {
        Self::new(Dynamic::Bool(value))
    }
}

impl DefaultValue for StaticDefault {
    fn description(&self) -> String {
        format!("defaults to {:?}", self.value)
    }

    fn default_value(&self, _request: DefaultRequest) -> DefaultResponse {
        DefaultResponse {
            value: self.value.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AttributePath;

    #[test]
    fn static_defaults_return_their_value() {
        let request = || DefaultRequest {
            path: AttributePath::new("x"),
        };

        assert_eq!(
            StaticDefault::string("public").default_value(request()).value,
            Dynamic::String("public".to_string())
        );
        assert_eq!(
            StaticDefault::number(30.0).default_value(request()).value,
            Dynamic::Number(30.0)
        );
        assert_eq!(
            StaticDefault::bool(true).default_value(request()).value,
            Dynamic::Bool(true)
        );
    }
}
