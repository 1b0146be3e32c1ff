use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Public id prefix is not empty and start number is at least 1
/// - CORS origins are usable as header values
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.public_id.prefix.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "public_id.prefix cannot be empty".to_string(),
        ));
    }

    if config.public_id.start_number == 0 {
        return Err(ConfigError::ValidationError(
            "public_id.start_number must be at least 1".to_string(),
        ));
    }

    for origin in &config.cors.allowed_origins {
        let usable = !origin.is_empty()
            && origin
                .bytes()
                .all(|b| b.is_ascii_graphic() && b != b',');
        if !usable {
            return Err(ConfigError::ValidationError(format!(
                "cors.allowed_origins contains an invalid origin: {:?}",
                origin
            )));
        }
    }

    Ok(())
}
