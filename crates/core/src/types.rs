use sluice_plugin_protocol::CollaboratorError;
use thiserror::Error;

/// The main error type for sluice operations
#[derive(Debug, Error)]
pub enum SluiceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Task '{0}' is already registered")]
    DuplicateTask(String),

    #[error("Task '{0}' not found")]
    UnknownTask(String),

    #[error("Task '{task}' depends on '{dependency}' which is not registered")]
    UnknownDependency { task: String, dependency: String },

    #[error("Circular dependency detected: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("Task '{task}' failed: {cause}")]
    TaskFailure {
        task: String,
        #[source]
        cause: Box<SluiceError>,
    },

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Invalid glob pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    #[error("Task error: {0}")]
    Task(String),

    #[error("Interrupted by shutdown")]
    Interrupted,

    /// An error the task already reported through the failure notifier
    #[error(transparent)]
    Notified(Box<SluiceError>),
}

impl SluiceError {
    /// Wrap an error raised while running `task`.
    ///
    /// Failures that already name a task are passed through so nested runs
    /// (a watch session re-running a plan) keep the innermost task name.
    pub fn task_failure(task: impl Into<String>, cause: SluiceError) -> Self {
        match cause {
            failure @ SluiceError::TaskFailure { .. } => failure,
            cause => SluiceError::TaskFailure {
                task: task.into(),
                cause: Box::new(cause),
            },
        }
    }

    /// Name of the failed task, if this is a runtime task failure.
    pub fn failed_task(&self) -> Option<&str> {
        match self {
            SluiceError::TaskFailure { task, .. } => Some(task),
            _ => None,
        }
    }

    /// Mark this error as already reported to the user.
    pub fn notified(self) -> Self {
        match self {
            notified @ SluiceError::Notified(_) => notified,
            other => SluiceError::Notified(Box::new(other)),
        }
    }

    /// Whether the failing task already reported this error itself.
    pub fn is_notified(&self) -> bool {
        match self {
            SluiceError::Notified(_) => true,
            SluiceError::TaskFailure { cause, .. } => cause.is_notified(),
            _ => false,
        }
    }

    /// Configuration-time errors abort an invocation before any task runs.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            SluiceError::Config(_)
                | SluiceError::Yaml(_)
                | SluiceError::DuplicateTask(_)
                | SluiceError::UnknownTask(_)
                | SluiceError::UnknownDependency { .. }
                | SluiceError::CyclicDependency { .. }
                | SluiceError::Pattern { .. }
        )
    }
}

/// Result type alias for sluice operations
pub type SluiceResult<T> = Result<T, SluiceError>;
