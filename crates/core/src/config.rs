use crate::error::ConfigError;

/// Required provider settings, read from the environment at startup so a
/// missing key fails fast with the variable's name instead of surfacing
/// later as an opaque request error.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub qdrant_url: String,
    pub qdrant_api_key: String,
    pub gemini_api_key: String,
}

impl BackendConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            qdrant_url: require_env("QDRANT_URL")?,
            qdrant_api_key: require_env("QDRANT_API_KEY")?,
            gemini_api_key: require_env("GEMINI_API_KEY")?,
        })
    }
}

fn require_env(name: &str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnv(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::require_env;

    #[test]
    fn absent_variable_reports_its_name() {
        let error = require_env("RULEBOOK_QA_TEST_ABSENT").expect_err("variable is absent");
        assert!(error.to_string().contains("RULEBOOK_QA_TEST_ABSENT"));
    }

    #[test]
    fn blank_variable_counts_as_missing() {
        std::env::set_var("RULEBOOK_QA_TEST_BLANK", "   ");
        assert!(require_env("RULEBOOK_QA_TEST_BLANK").is_err());
        std::env::remove_var("RULEBOOK_QA_TEST_BLANK");
    }

    #[test]
    fn present_variable_is_returned() {
        std::env::set_var("RULEBOOK_QA_TEST_PRESENT", "http://localhost:6333");
        assert_eq!(
            require_env("RULEBOOK_QA_TEST_PRESENT").expect("variable is set"),
            "http://localhost:6333"
        );
        std::env::remove_var("RULEBOOK_QA_TEST_PRESENT");
    }
}
