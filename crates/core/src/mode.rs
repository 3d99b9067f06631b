//! Build mode selected through `SLUICE_ENV`

use std::fmt;

pub const MODE_ENV_VAR: &str = "SLUICE_ENV";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Source maps, watcher and dev server.
    #[default]
    Development,
    /// Minified output, clean before build.
    Production,
}

impl Mode {
    /// Read the mode from the environment
    pub fn from_env() -> Self {
        Self::parse(std::env::var(MODE_ENV_VAR).ok().as_deref())
    }

    /// Unset or `development` is development; anything else is production.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            None | Some("development") => Mode::Development,
            Some(_) => Mode::Production,
        }
    }

    pub fn is_development(self) -> bool {
        self == Mode::Development
    }

    pub fn source_maps(self) -> bool {
        self.is_development()
    }

    pub fn minify(self) -> bool {
        !self.is_development()
    }

    /// Whether the default task starts the watcher and dev server
    pub fn auto_serve(self) -> bool {
        self.is_development()
    }

    /// Whether the default task cleans the build directory first
    pub fn clean_first(self) -> bool {
        !self.is_development()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Development => f.write_str("development"),
            Mode::Production => f.write_str("production"),
        }
    }
}
