use thiserror::Error;

#[derive(Error, Debug)]
pub enum IvolError {
    #[error("Unable to open results archive {archive}: {reason}")]
    SourceUnavailable { archive: String, reason: String },

    #[error("The step {step} does not exist in archive {archive}")]
    UnknownStep {
        step: String,
        archive: String,
        available: Vec<String>,
        conditioning: bool,
    },

    #[error("The part instance {instance} does not exist in archive {archive}")]
    UnknownPartInstance {
        instance: String,
        archive: String,
        available: Vec<String>,
    },

    #[error("Required argument not provided: {name}")]
    MissingArgument { name: String },

    #[error("Not a valid response: {response}")]
    InvalidResponse { response: String },

    #[error("Step {step} in archive {archive} has no frame {index}")]
    MissingFrame {
        step: String,
        archive: String,
        index: String,
    },

    #[error("Field output {field} not found in step {step} of archive {archive}")]
    MissingFieldOutput {
        field: String,
        step: String,
        archive: String,
    },

    #[error("Field output {field} has {found} values, expected {expected}")]
    FrameMismatch {
        field: String,
        expected: usize,
        found: usize,
    },

    #[error("Invalid {kind} value at element {element_label}, point {integration_point}: {message}")]
    InvalidTensor {
        kind: String,
        element_label: i64,
        integration_point: i64,
        message: String,
    },

    #[error("Output file already exists: {path}")]
    OutputExists { path: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operation was cancelled by user")]
    Cancelled,
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for IvolError {
    fn user_message(&self) -> String {
        match self {
            IvolError::SourceUnavailable { archive, reason } => {
                format!("Unable to open the specified archive {}: {}", archive, reason)
            }
            IvolError::UnknownStep {
                step,
                archive,
                available,
                ..
            } => {
                format!(
                    "The step {} does not exist in archive {}. It should be one of these: {}",
                    step,
                    archive,
                    format_catalog(available)
                )
            }
            IvolError::UnknownPartInstance {
                instance,
                archive,
                available,
            } => {
                format!(
                    "The part instance {} does not exist in archive {}. It should be one of these: {}",
                    instance,
                    archive,
                    format_catalog(available)
                )
            }
            IvolError::MissingArgument { name } => {
                format!("All required arguments are not provided (missing {})", name)
            }
            IvolError::InvalidResponse { response } => {
                format!("Not a valid response: '{}'", response)
            }
            IvolError::FrameMismatch {
                field,
                expected,
                found,
            } => {
                format!(
                    "Frames are not aligned: {} has {} values but the pre-conditioning frame has {}",
                    field, found, expected
                )
            }
            IvolError::OutputExists { path } => {
                format!("Output file already exists: {}", path)
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            IvolError::SourceUnavailable { .. } => Some(
                "Verify that the archive exists and was exported with a supported format version.".to_string()
            ),
            IvolError::UnknownStep { conditioning: true, .. } => Some(
                "Check the case of the step name. If the pre-conditioning results are in a different archive, use the --old-odb option.".to_string()
            ),
            IvolError::UnknownStep { .. } => Some(
                "Check the case of the step name.".to_string()
            ),
            IvolError::UnknownPartInstance { .. } => Some(
                "Check the part instance name, or use ASSEMBLY to select the whole assembly.".to_string()
            ),
            IvolError::MissingArgument { .. } => Some(
                "Run with --help to see the required arguments.".to_string()
            ),
            IvolError::MissingFieldOutput { .. } => Some(
                "Field output requests must include strain, stress, state variables and integration point volume (LE, S, SDV, IVOL).".to_string()
            ),
            IvolError::FrameMismatch { .. } => Some(
                "Pre-conditioning and cyclic results must come from the same mesh with identical output requests.".to_string()
            ),
            IvolError::OutputExists { .. } => Some(
                "Use --overwrite yes to replace the file, or choose a different name with --output.".to_string()
            ),
            IvolError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all required fields are present.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for IvolError {
    fn from(error: toml::de::Error) -> Self {
        IvolError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IvolError>;

fn format_catalog(names: &[String]) -> String {
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    }
}
