//! Configuration validation.

use crate::config::Config;
use crate::constants::{confidence, inference_size};
use crate::error::{Error, Result};

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_defaults(config)?;
    validate_output(config)?;
    Ok(())
}

/// Validate default settings.
fn validate_defaults(config: &Config) -> Result<()> {
    let defaults = &config.defaults;

    validate_unit_interval("confidence", defaults.confidence)?;
    validate_unit_interval("iou", defaults.iou)?;

    if defaults.max_detections == 0 {
        return Err(Error::ConfigValidation {
            message: "max_detections must be at least 1".to_string(),
        });
    }

    if let Some(imgsz) = defaults.imgsz {
        validate_imgsz(imgsz)?;
    }

    if defaults.tracker.trim().is_empty() {
        return Err(Error::ConfigValidation {
            message: "tracker reference must not be empty".to_string(),
        });
    }

    Ok(())
}

/// Validate output settings.
fn validate_output(config: &Config) -> Result<()> {
    if config.output.codec.trim().is_empty() {
        return Err(Error::ConfigValidation {
            message: "output codec must not be empty".to_string(),
        });
    }
    Ok(())
}

/// Check that a threshold lies in `[0, 1]`.
fn validate_unit_interval(name: &str, value: f32) -> Result<()> {
    if !(confidence::MIN..=confidence::MAX).contains(&value) {
        return Err(Error::ConfigValidation {
            message: format!(
                "{name} must be between {} and {}, got {value}",
                confidence::MIN,
                confidence::MAX
            ),
        });
    }
    Ok(())
}

/// Check that a fixed inference size is usable by the model.
pub fn validate_imgsz(imgsz: u32) -> Result<()> {
    if imgsz == 0 || imgsz % inference_size::STRIDE != 0 {
        return Err(Error::ConfigValidation {
            message: format!(
                "imgsz must be a positive multiple of {}, got {imgsz}",
                inference_size::STRIDE
            ),
        });
    }
    Ok(())
}
