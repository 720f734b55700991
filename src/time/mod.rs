pub mod error;
pub mod timeunit;

use std::time::Duration;

/// Renders a duration for humans: `850ms`, `1.204s`, `2m 05s`.
pub fn humanize(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else if millis < 60_000 {
        format!("{:.3}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::humanize;
    use std::time::Duration;

    #[test]
    fn test_humanize_picks_unit_by_magnitude() {
        assert_eq!(humanize(Duration::from_millis(50)), "50ms");
        assert_eq!(humanize(Duration::from_millis(1204)), "1.204s");
        assert_eq!(humanize(Duration::from_secs(125)), "2m 05s");
    }
}
