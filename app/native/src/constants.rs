//! Application-wide constants.

/// Application name, used for directory and file names.
pub const APP_NAME: &str = "heicwall";

/// Name of the serialized definition inside each per-hash cache directory.
pub const DEFINITION_FILE_NAME: &str = "definition.json";

/// Environment variable holding the log filter.
pub const LOG_ENV_VAR: &str = "HEICWALL_LOG";
