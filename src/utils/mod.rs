pub mod errors;

pub use errors::PlayerError;

/// Format seconds as `m:ss` for the control bar.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "0:00");
        assert_eq!(format_duration(59.9), "0:59");
        assert_eq!(format_duration(121.4), "2:01");
        assert_eq!(format_duration(3600.0), "60:00");
        assert_eq!(format_duration(f64::NAN), "0:00");
    }
}
