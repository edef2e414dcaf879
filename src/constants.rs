/// Session-manager property whose presence proves the session is usable
pub(crate) const CURRENT_SESSION_PATH: &str = "currentSession";

/// Default server-side bound of one `waitForUpdates` call
pub(crate) const DEFAULT_MAX_WAIT_IN_SECS: u64 = 60;

/// Environment variable prefix for configuration overrides
pub(crate) const CONFIG_ENV_PREFIX: &str = "PROP_MONITOR";

/// Environment variable naming an optional configuration file
pub(crate) const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
