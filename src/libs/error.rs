use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerepError {
    /// Invalid combination of settings, detected before any work is done
    Config(String),
    /// An external tool is missing or exited with an error
    Tool {
        /// Name of the executable
        name: String,
        /// What went wrong, including the tool's stderr when available
        message: String,
    },
    /// An assembly file that can't be read
    Format {
        /// Path of the offending file
        path: String,
        /// A human-readable message explaining the error
        message: String,
    },
    /// A pair of assemblies without a distance
    MissingDistance(String, String),
}

impl fmt::Display for DerepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DerepError::Config(msg) => write!(f, "Invalid settings: {}", msg),
            DerepError::Tool { name, message } => write!(f, "{} failed: {}", name, message),
            DerepError::Format { path, message } => write!(f, "{}: {}", path, message),
            DerepError::MissingDistance(a, b) => {
                write!(f, "No distance between {} and {}", a, b)
            }
        }
    }
}

impl std::error::Error for DerepError {}
