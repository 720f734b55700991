use crate::reporter::Report;
use crate::time::humanize;
use std::fmt;

pub struct Console<'r> {
    report: &'r Report,
}

impl<'r> Console<'r> {
    pub fn new(report: &'r Report) -> Self {
        Self { report }
    }
}

impl fmt::Display for Console<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        let summary = &report.summary;
        writeln!(
            f,
            "Tests: {} total, {} passed, {} failed ({}%) in {}",
            summary.total,
            summary.passed,
            summary.failed,
            summary.success_rate,
            humanize(summary.duration)
        )?;

        if !report.suites.is_empty() {
            let width = report.suites.iter().map(|s| s.name.len()).max().unwrap_or(0);
            writeln!(f)?;
            writeln!(f, "Suites:")?;
            for suite in &report.suites {
                writeln!(
                    f,
                    "  {:<width$}  {}/{} passed  {:>3}%  {}",
                    suite.name,
                    suite.passed,
                    suite.total,
                    suite.success_rate,
                    humanize(suite.duration),
                    width = width
                )?;
            }
        }

        if !report.slow_tests.is_empty() {
            writeln!(f)?;
            writeln!(f, "Slowest tests:")?;
            for (rank, test) in report.slow_tests.iter().enumerate() {
                writeln!(
                    f,
                    "  {}. {} > {}  {}",
                    rank + 1,
                    test.suite,
                    test.name,
                    humanize(test.duration)
                )?;
            }
        }

        if !report.failed_tests.is_empty() {
            writeln!(f)?;
            writeln!(f, "Failed tests:")?;
            for test in &report.failed_tests {
                writeln!(
                    f,
                    "  x {} > {} after {} attempt(s): {}",
                    test.suite, test.name, test.attempts, test.error
                )?;
            }
        }

        if !report.hook_errors.is_empty() {
            writeln!(f)?;
            writeln!(
                f,
                "{} hook error(s) were ignored, see the log for details",
                report.hook_errors.len()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::reporter::test::sample;
    use crate::reporter::Reporter;
    use std::time::Duration;

    #[test]
    fn test_console_lists_every_section() {
        let report = Reporter::default().build(&sample(), Duration::from_millis(90));
        let text = report.console().to_string();

        assert!(text.starts_with("Tests: 4 total, 3 passed, 1 failed (75%) in 90ms"));
        assert!(text.contains("  Math  2/2 passed  100%  15ms"));
        assert!(text.contains("  1. IO > reads  40ms"));
        assert!(text.contains("  x IO > reads after 3 attempt(s): file missing"));
        assert!(!text.contains("hook error"));
    }

    #[test]
    fn test_console_for_empty_report() {
        let report = Reporter::default().build(&[], Duration::from_millis(0));

        assert_eq!(
            report.console().to_string(),
            "Tests: 0 total, 0 passed, 0 failed (0%) in 0ms\n"
        );
    }
}
