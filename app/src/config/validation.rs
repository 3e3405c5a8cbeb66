//! Setting value validation.

use globset::Glob;

/// Largest corner radius that still fits the short side of either canvas.
pub const MAX_CORNER_RADIUS: i64 = 640;

/// Validate a setting value. Returns `Ok(())` if valid, or an error message.
pub fn validate_setting(key: &str, value: &str) -> Result<(), String> {
    match key {
        "BASE_DIRECTORY" => {
            if value.trim().is_empty() {
                return Err("must not be empty".into());
            }
        }
        "FILE_FILTER" => {
            if value.contains('/') || value.contains('\\') {
                return Err("must match file names only, without path separators".into());
            }
            Glob::new(value).map_err(|e| format!("invalid pattern: {e}"))?;
        }
        "CORNER_RADIUS" => validate_int_range(value, 1, MAX_CORNER_RADIUS)?,
        "WORKER_COUNT" => validate_int_range(value, 1, 32)?,
        "QUEUE_CAPACITY" => validate_int_range(value, 1, 10_000)?,
        "SETTLE_TIMEOUT_MS" => validate_int_range(value, 0, 60_000)?,
        _ => {}
    }
    Ok(())
}

fn validate_int_range(value: &str, min: i64, max: i64) -> Result<(), String> {
    let v: i64 = value.parse().map_err(|_| "must be an integer")?;
    if v < min || v > max {
        return Err(format!("must be between {min} and {max}"));
    }
    Ok(())
}
