use thiserror::Error;

#[derive(Error, Debug)]
pub enum RootAuditError {
    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Failed to list {target}: {message}")]
    EnumerationError { target: String, message: String },

    #[error("Failed to exec in container {container} of pod {namespace}/{pod}: {message}")]
    ExecError {
        namespace: String,
        pod: String,
        container: String,
        message: String,
    },

    #[error("Kubernetes error: {0}")]
    KubernetesError(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl RootAuditError {
    pub fn enumeration(target: impl Into<String>, message: impl ToString) -> Self {
        Self::EnumerationError {
            target: target.into(),
            message: message.to_string(),
        }
    }

    pub fn exec(namespace: &str, pod: &str, container: &str, message: impl ToString) -> Self {
        Self::ExecError {
            namespace: namespace.to_string(),
            pod: pod.to_string(),
            container: container.to_string(),
            message: message.to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, RootAuditError>;
