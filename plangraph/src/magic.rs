/// Name of the environment variable containing the path to the configuration file.
/// If not set, defaults to
///  (1) on Linux and macOS: `$XDG_CONFIG_HOME/plangraph/config.toml` or `$HOME/.config/plangraph/config.toml`
///  (2) on Windows: `%APPDATA%\plangraph\config.toml`
pub const ENV_CONFIG_PATH: &str = "PLANGRAPH_CONFIG";

/// Directory name used below the platform configuration directory.
pub const CONFIG_DIR_NAME: &str = "plangraph";

/// File name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Leading token of every rendered state identifier.
pub const STATE_TOKEN_PREFIX: &str = "s";

/// Sign markers of rendered state identifiers. The consuming grammar has no
/// signed numerals inside identifiers.
pub const STATE_TOKEN_POSITIVE: char = 'p';
pub const STATE_TOKEN_NEGATIVE: char = 'm';
