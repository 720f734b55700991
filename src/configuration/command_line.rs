use crate::configuration::constants::cargo_env::CARGO_PKG_NAME;
use crate::configuration::settings::RunConfig;
use crate::time::timeunit::parse_duration;
use clap::arg_enum;
use log::LevelFilter;
use std::path::PathBuf;
use std::time::Duration;
use structopt::StructOpt;

arg_enum! {
    #[derive(Debug)]
    pub enum LogLevel {
        Off, Error, Warn, Info, Debug, Trace,
    }
}

#[derive(StructOpt, Debug)]
#[structopt(name = CARGO_PKG_NAME)]
pub struct Opt {
    /// Run configuration file. Supported: YAML, JSON, TOML
    #[structopt(parse(from_os_str))]
    pub file: Option<PathBuf>,

    /// Sets a logging level
    #[structopt(case_insensitive = true, long, short = "L", possible_values = &LogLevel::variants(), env = "LOG_LEVEL")]
    pub logging: Option<LogLevel>,

    /// File to which application will write logs
    #[structopt(long, short = "O", env = "LOG_OUTPUT_FILE")]
    pub log_output_file: Option<PathBuf>,

    /// Run all selected tests concurrently
    #[structopt(long, short = "p")]
    pub parallel: bool,

    /// Stop a suite's remaining tests after the first failure
    #[structopt(long, short = "b")]
    pub bail: bool,

    /// Do not log individual results
    #[structopt(long, short = "q")]
    pub quiet: bool,

    /// Per-attempt deadline, e.g. 500ms or 30s
    #[structopt(long, short = "t", parse(try_from_str = parse_duration))]
    pub timeout: Option<Duration>,

    /// Extra attempts for a failing test
    #[structopt(long, short = "r")]
    pub retries: Option<u32>,

    /// Write the JSON report into this file
    #[structopt(long, parse(from_os_str))]
    pub json: Option<PathBuf>,

    /// Write the JUnit XML report into this file
    #[structopt(long, parse(from_os_str))]
    pub junit: Option<PathBuf>,
}

impl Opt {
    /// Command line flags win over whatever the configuration file said.
    pub fn apply(&self, config: &mut RunConfig) {
        if self.parallel {
            config.parallel = true;
        }
        if self.bail {
            config.bail = true;
        }
        if self.quiet {
            config.verbose = false;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(retries) = self.retries {
            config.retries = retries;
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
mod test {
    use super::Opt;
    use crate::configuration::settings::RunConfig;
    use std::time::Duration;
    use structopt::StructOpt;

    #[test]
    fn test_flags_override_configuration() {
        let options = Opt::from_iter(&[
            "crucible", "--parallel", "-q", "--timeout", "750ms", "-r", "0",
        ]);
        let mut config = RunConfig::default();
        options.apply(&mut config);

        assert!(config.parallel);
        assert!(!config.verbose);
        assert!(!config.bail);
        assert_eq!(config.timeout, Duration::from_millis(750));
        assert_eq!(config.retries, 0);
    }

    #[test]
    fn test_config_file_is_positional() {
        let options = Opt::from_iter(&["crucible", "run.yaml", "--junit", "out.xml"]);

        assert_eq!(options.file.unwrap().to_str(), Some("run.yaml"));
        assert_eq!(options.junit.unwrap().to_str(), Some("out.xml"));
        assert!(options.json.is_none());
    }
}
