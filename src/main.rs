#[macro_use]
extern crate log;

mod smoke;

use crucible::configuration::command_line::{LogLevel, Opt};
use crucible::{App, Report, Reporter, RunConfig};
use log::LevelFilter;
use signal_hook::{consts::SIGINT, iterator::Signals};
use std::path::{Path, PathBuf};
use std::{process::exit, thread, time::Duration};
use structopt::StructOpt;

#[tokio::main]
async fn main() {
    let mut options = Opt::from_args();

    if let Err(e) = init_logging(
        options.logging.take().unwrap_or(LogLevel::Info).into(),
        &options.log_output_file,
    ) {
        eprintln!("Failed to initialize logging {}", e);
        exit(2);
    }

    match Signals::new(&[SIGINT]) {
        Ok(mut signals) => {
            thread::spawn(move || {
                for sig in signals.forever() {
                    info!("Received signal {:?}, stopping", sig);
                    exit(130);
                }
            });
        }
        Err(e) => warn!("Cannot listen for SIGINT {}", e),
    }

    let mut config = match RunConfig::load(options.file.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load run configuration {}", e);
            exit(2);
        }
    };
    options.apply(&mut config);
    debug!("Initiated configuration {:#?}", config);

    let registry = match smoke::registry() {
        Ok(registry) => registry,
        Err(e) => {
            error!("Failed to declare smoke suites {}", e);
            exit(2);
        }
    };
    let app = App::new(registry, config);
    let report = match app.run().await {
        Ok(report) => report,
        Err(e) => {
            error!("Run aborted {}", e);
            Reporter::new(app.config()).build(&[], Duration::from_millis(0))
        }
    };

    println!("{}", report.console());
    export(&report, options.json.as_deref(), options.junit.as_deref());

    // Leave through `exit` so that detached blocking bodies that timed out
    // cannot hold the runtime shutdown.
    exit(exit_code(&report));
}

fn exit_code(report: &Report) -> i32 {
    if report.has_failures() {
        1
    } else {
        0
    }
}

fn export(report: &Report, json: Option<&Path>, junit: Option<&Path>) {
    if let Some(path) = json {
        match report.to_json() {
            Ok(content) => write_report(path, &content),
            Err(e) => error!("Failed to serialize report {}", e),
        }
    }
    if let Some(path) = junit {
        match report.to_junit_xml() {
            Ok(content) => write_report(path, &content),
            Err(e) => error!("Failed to serialize JUnit report {}", e),
        }
    }
}

fn write_report(path: &Path, content: &str) {
    match std::fs::write(path, content) {
        Ok(()) => info!("Report written to {}", path.display()),
        Err(e) => error!("Failed to write report to {}: {}", path.display(), e),
    }
}

fn init_logging(level: LevelFilter, output: &Option<PathBuf>) -> Result<(), fern::InitError> {
    let mut dispatcher = fern::Dispatch::new()
        // Perform allocation-free log formatting
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}:{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record
                    .line()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "".to_owned()),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout());

    if let Some(log_file) = output {
        dispatcher = dispatcher.chain(fern::log_file(log_file)?)
    }
    dispatcher.apply()?;
    info!("Logging level {} enabled", level);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::exit_code;
    use crucible::{Reporter, TestResult};
    use std::time::Duration;

    #[test]
    fn test_exit_code_follows_failures() {
        let reporter = Reporter::default();
        assert_eq!(exit_code(&reporter.build(&[], Duration::from_millis(0))), 0);

        let failed: TestResult = serde_json::from_str(
            r#"{"suite":"A","name":"a1","passed":false,"durationMs":3.0,"attempts":1,
                "error":{"kind":"assertion","message":"nope"},"timestamp":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(exit_code(&reporter.build(&[failed], Duration::from_millis(3))), 1);
    }
}
