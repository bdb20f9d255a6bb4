//! CLI argument validators.
//!
//! Shared validation functions for CLI argument parsing.

use crate::config::validate_imgsz;

/// Parse a float that must lie in `[0, 1]`.
pub fn parse_unit_interval(s: &str, name: &str) -> Result<f32, String> {
    let value: f32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if !(0.0..=1.0).contains(&value) {
        return Err(format!("{name} must be between 0.0 and 1.0, got {value}"));
    }

    Ok(value)
}

/// Parse and validate confidence value (0.0-1.0).
pub fn parse_confidence(s: &str) -> Result<f32, String> {
    parse_unit_interval(s, "confidence")
}

/// Parse and validate an NMS IoU threshold (0.0-1.0).
pub fn parse_iou(s: &str) -> Result<f32, String> {
    parse_unit_interval(s, "iou")
}

/// Parse a fixed inference size (positive multiple of the model stride).
pub fn parse_imgsz(s: &str) -> Result<u32, String> {
    let value: u32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid size"))?;
    validate_imgsz(value).map_err(|e| e.to_string())?;
    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_confidence_valid() {
        assert_eq!(parse_confidence("0.5").ok(), Some(0.5));
        assert_eq!(parse_confidence("0.0").ok(), Some(0.0));
        assert_eq!(parse_confidence("1.0").ok(), Some(1.0));
    }

    #[test]
    fn test_parse_confidence_invalid() {
        assert!(parse_confidence("1.5").is_err());
        assert!(parse_confidence("-0.1").is_err());
        assert!(parse_confidence("abc").is_err());
    }

    #[test]
    fn test_parse_iou_names_field() {
        assert_eq!(parse_iou("0.7").ok(), Some(0.7));
        let err = parse_iou("2").unwrap_err();
        assert!(err.contains("iou"));
    }

    #[test]
    fn test_parse_imgsz() {
        assert_eq!(parse_imgsz("640").ok(), Some(640));
        assert_eq!(parse_imgsz("1280").ok(), Some(1280));
        assert!(parse_imgsz("0").is_err());
        assert!(parse_imgsz("650").is_err());
        assert!(parse_imgsz("-32").is_err());
        assert!(parse_imgsz("big").is_err());
    }
}
