use crate::app::error::RunError;
use crate::app::registry::Test;
use std::time::Duration;

/// Narrows the declared tests down to the ones a run executes.
///
/// When any test is marked `only`, exactly the `only` tests run and their
/// `skip` flag is ignored. Otherwise every test not marked `skip` runs.
/// Declaration order is preserved either way.
pub fn select(tests: Vec<&Test>) -> Result<Vec<&Test>, RunError> {
    let declared = tests.len();
    let focused = tests.iter().any(|t| t.options().only);
    let selected: Vec<&Test> = tests
        .into_iter()
        .filter(|t| {
            if focused {
                t.options().only
            } else {
                !t.options().skip
            }
        })
        .collect();

    if let Some(test) = selected
        .iter()
        .find(|t| t.options().timeout == Some(Duration::from_millis(0)))
    {
        return Err(RunError::InvalidTest { test: test.key() });
    }

    if focused {
        info!("Running {} focused test(s) out of {}", selected.len(), declared);
    } else if selected.len() < declared {
        info!("Skipping {} test(s)", declared - selected.len());
    }
    Ok(selected)
}
