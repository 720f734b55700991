use crate::app::result::TestResult;
use crate::reporter::Report;
use quick_junit::{NonSuccessKind, TestCase, TestCaseStatus, TestSuite};

/// JUnit document for a [`Report`]: one `<testsuite>` per suite, one
/// `<testcase>` per result, in the order the report lists them.
pub fn document(report: &Report) -> quick_junit::Report {
    let mut document = quick_junit::Report::new(report.environment.name.as_str());
    document
        .set_timestamp(report.environment.generated_at)
        .set_time(report.summary.duration);

    for suite in &report.suites {
        let mut element = TestSuite::new(suite.name.as_str());
        element.set_time(suite.duration);
        element.add_test_cases(
            report
                .results
                .iter()
                .filter(|r| r.suite == suite.name)
                .map(test_case),
        );
        document.add_test_suite(element);
    }
    document
}

fn test_case(result: &TestResult) -> TestCase {
    let status = if result.passed {
        TestCaseStatus::success()
    } else {
        let mut status = TestCaseStatus::non_success(NonSuccessKind::Failure);
        match &result.error {
            Some(failure) => {
                status
                    .set_message(failure.message.as_str())
                    .set_type(failure.kind.to_string())
                    .set_description(failure.stack.as_deref().unwrap_or(&failure.message));
            }
            None => {
                status.set_message("test failed");
            }
        }
        status
    };
    let mut case = TestCase::new(result.name.as_str(), status);
    case.set_classname(result.suite.as_str())
        .set_time(result.duration);
    case
}
