//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::output::OutputFormat;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.parallel_workers == 0 {
            return Err(ConfigError::ValidationError(
                "processing.parallel_workers must be > 0".into(),
            ));
        }
        if self.limits.max_file_size_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_bytes must be > 0".into(),
            ));
        }
        if self.limits.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "limits.supported_formats must not be empty".into(),
            ));
        }
        if self.embedding.image_size == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.image_size must be > 0".into(),
            ));
        }
        if self.embedding.embedding_dim == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.embedding_dim must be > 0".into(),
            ));
        }
        if self.embedding.context_length == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.context_length must be > 0".into(),
            ));
        }
        if !(self.scoring.temperature > 0.0 && self.scoring.temperature.is_finite()) {
            return Err(ConfigError::ValidationError(
                "scoring.temperature must be a finite value > 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.scoring.min_confidence) {
            return Err(ConfigError::ValidationError(
                "scoring.min_confidence must be between 0.0 and 1.0".into(),
            ));
        }
        if self.scoring.max_conditions == 0 {
            return Err(ConfigError::ValidationError(
                "scoring.max_conditions must be > 0".into(),
            ));
        }
        if OutputFormat::parse(&self.output.format).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "output.format must be \"json\" or \"jsonl\", got \"{}\"",
                self.output.format
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_checks_output_format() {
        let mut config = Config::default();
        config.output.format = "jsonl".into();
        assert!(config.validate().is_ok());

        config.output.format = "yaml".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("output.format"));
    }

    #[test]
    fn test_validate_rejects_zero_parallel_workers() {
        let mut config = Config::default();
        config.processing.parallel_workers = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("parallel_workers"));
    }

    #[test]
    fn test_validate_rejects_empty_formats() {
        let mut config = Config::default();
        config.limits.supported_formats.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("supported_formats"));
    }

    #[test]
    fn test_validate_rejects_bad_temperature() {
        let mut config = Config::default();
        config.scoring.temperature = -0.07;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("temperature"));

        config.scoring.temperature = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_invalid_min_confidence() {
        let mut config = Config::default();
        config.scoring.min_confidence = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min_confidence"));

        config.scoring.min_confidence = -0.1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min_confidence"));
    }

    #[test]
    fn test_validate_rejects_zero_max_conditions() {
        let mut config = Config::default();
        config.scoring.max_conditions = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_conditions"));
    }
}
