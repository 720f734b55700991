pub mod cargo_env {
    pub const CARGO_PKG_NAME: &str = env!("CARGO_PKG_NAME");
    pub const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
}

pub mod common {
    use std::time::Duration;

    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);
    pub const DEFAULT_RETRIES: u32 = 2;
    pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);
    pub const DEFAULT_SLOW_TESTS: usize = 5;
    pub const ENV_PREFIX: &str = "CRUCIBLE";
}
