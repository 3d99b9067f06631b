use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Command {
    Single(String),
    Multiple(Vec<String>),
}

impl Command {
    pub fn lines(&self) -> Vec<&str> {
        match self {
            Command::Single(cmd) => vec![cmd.as_str()],
            Command::Multiple(cmds) => cmds.iter().map(String::as_str).collect(),
        }
    }
}

/// A task declared in `sluice.yml` that runs a shell command or a script
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskConfig {
    pub name: String,
    pub description: Option<String>,
    /// Script path, relative to the project root.
    pub script: Option<String>,
    /// Shell command, or a list of commands run one after another.
    pub command: Option<Command>,
    /// Tasks that must complete first, built-in or declared here.
    pub dependencies: Option<Vec<String>>,
}

impl TaskConfig {
    pub fn dependencies(&self) -> &[String] {
        self.dependencies.as_deref().unwrap_or_default()
    }
}
