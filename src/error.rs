use std::error::Error;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum SetupError {
    Io(io::Error),
    SerdeJson(serde_json::Error),
    Config(String),
    InvalidPlatform(String),
    Aws {
        operation: &'static str,
        resource: String,
        message: String,
    },
}

impl SetupError {
    pub fn aws(
        operation: &'static str,
        resource: impl Into<String>,
        message: impl fmt::Display,
    ) -> Self {
        SetupError::Aws {
            operation,
            resource: resource.into(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SetupError::Io(e) => write!(f, "IO error: {}", e),
            SetupError::SerdeJson(e) => write!(f, "JSON serialization error: {}", e),
            SetupError::Config(msg) => write!(f, "Configuration error: {}", msg),
            SetupError::InvalidPlatform(msg) => write!(f, "Invalid target platform: {}", msg),
            SetupError::Aws {
                operation,
                resource,
                message,
            } => write!(
                f,
                "Failed to {} for {}. Encountered error: {}",
                operation, resource, message
            ),
        }
    }
}

impl Error for SetupError {}

impl From<io::Error> for SetupError {
    fn from(error: io::Error) -> Self {
        SetupError::Io(error)
    }
}

impl From<serde_json::Error> for SetupError {
    fn from(error: serde_json::Error) -> Self {
        SetupError::SerdeJson(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aws_error_names_operation_and_resource() {
        let err = SetupError::aws("get role", "Sagemaker_MyFleet_role", "AccessDenied");
        assert_eq!(
            err.to_string(),
            "Failed to get role for Sagemaker_MyFleet_role. Encountered error: AccessDenied"
        );
    }
}
