use thiserror::Error;

/// Errors raised while registering routes, resolving handler arguments or invoking handlers.
///
/// "No handler for this update" is not an error: dispatch returns `Ok(None)` and message
/// handlers return `Ok(false)` for that case.
#[derive(Error, Debug)]
pub enum RouteError {
    #[error("unknown update type \"{0}\"")]
    InvalidUpdateType(String),

    #[error("handler for \"{0}\" already exists")]
    DuplicateHandler(String),

    #[error("dependency \"{key}\" for parameter \"{param}\" not found")]
    DependencyNotFound { param: String, key: String },

    #[error("{0} not found in container")]
    NotFound(String),

    #[error("command handler not found: {0}")]
    CommandHandlerNotFound(String),

    #[error("message entity handler not found: {0}")]
    EntityHandlerNotFound(String),

    #[error("container not found")]
    ContainerMissing,

    #[error("malformed update: {0}")]
    MalformedUpdate(String),

    #[error("argument {index} is not a {expected}")]
    ArgumentType { index: usize, expected: &'static str },

    #[error("session error: {0}")]
    Session(String),

    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

impl From<serde_json::Error> for RouteError {
    fn from(e: serde_json::Error) -> Self {
        RouteError::MalformedUpdate(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RouteError>;
