//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a competitor id has the `<w|m>-<row index>` shape.
///
/// # Examples
///
/// ```ignore
/// validate_competitor_id("w-0")   // Ok
/// validate_competitor_id("m-12")  // Ok
/// validate_competitor_id("x-1")   // Err - unknown division prefix
/// validate_competitor_id("w-")    // Err - missing index
/// ```
pub fn validate_competitor_id(id: &str) -> Result<(), ValidationError> {
    let Some((prefix, index)) = id.split_once('-') else {
        let mut err = ValidationError::new("competitor_id_format");
        err.message = Some("Competitor ID must look like `w-0` or `m-0`".into());
        return Err(err);
    };

    if prefix != "w" && prefix != "m" {
        let mut err = ValidationError::new("competitor_id_prefix");
        err.message = Some(format!("Unknown division prefix `{prefix}`").into());
        return Err(err);
    }

    if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
        let mut err = ValidationError::new("competitor_id_index");
        err.message = Some("Competitor ID must end with a row number".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_competitor_id_valid() {
        assert!(validate_competitor_id("w-0").is_ok());
        assert!(validate_competitor_id("m-12").is_ok());
    }

    #[test]
    fn test_validate_competitor_id_invalid() {
        assert!(validate_competitor_id("w0").is_err()); // no separator
        assert!(validate_competitor_id("x-1").is_err()); // unknown prefix
        assert!(validate_competitor_id("w-").is_err()); // empty index
        assert!(validate_competitor_id("m-1a").is_err()); // not a number
        assert!(validate_competitor_id("").is_err());
    }
}
