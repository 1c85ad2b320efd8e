use crate::error::{PipelineError, Result};

/// Convert a registry coordinate given as whole degrees plus minutes to
/// decimal degrees. The sign of the degrees applies to the minutes as well.
///
/// # Examples
/// ```
/// use smn_pipeline::utils::degrees_minutes_to_decimal;
///
/// let decimal = degrees_minutes_to_decimal(-38, 57).unwrap();
/// assert!((decimal - -38.95).abs() < 0.000001);
/// ```
pub fn degrees_minutes_to_decimal(degrees: i32, minutes: u32) -> Result<f64> {
    if minutes >= 60 {
        return Err(PipelineError::InvalidFormat(format!(
            "Minutes must be between 0 and 59, got: {}",
            minutes
        )));
    }

    let decimal_value = degrees.unsigned_abs() as f64 + minutes as f64 / 60.0;

    if degrees < 0 {
        Ok(-decimal_value)
    } else {
        Ok(decimal_value)
    }
}

/// Parse the degree and minute tokens of a registry line
pub fn parse_degrees_minutes(degrees: &str, minutes: &str) -> Result<f64> {
    let deg = degrees.trim().parse::<i32>().map_err(|_| {
        PipelineError::InvalidFormat(format!("Invalid degrees value: '{}'", degrees))
    })?;
    let min = minutes.trim().parse::<u32>().map_err(|_| {
        PipelineError::InvalidFormat(format!("Invalid minutes value: '{}'", minutes))
    })?;

    // "-0 30" still denotes the southern/western hemisphere
    let value = degrees_minutes_to_decimal(deg, min)?;
    if deg == 0 && degrees.trim().starts_with('-') {
        Ok(-value)
    } else {
        Ok(value)
    }
}
