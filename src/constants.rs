// src/constants.rs

/// The program version, propagated from the crate manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The name of the configuration file searched for in every directory.
pub const CONFIG_FILENAME: &str = "litr.toml";

/// The hidden variant of the configuration file.
pub const HIDDEN_CONFIG_FILENAME: &str = ".litr.toml";

/// Names that cannot be used for parameters or shortcuts. `help` and `h`
/// are claimed by the help hook, `or` and `and` by the script language.
pub const RESERVED_PARAMETER_NAMES: [&str; 4] = ["help", "h", "or", "and"];
