// src/errors.rs
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Prompt is empty")]
    EmptyPrompt,

    #[error("No API key configured")]
    MissingCredential,

    #[error("Image service returned status {status}")]
    RequestFailed { status: u16 },

    #[error("Image service returned no image")]
    EmptyResponse,

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl GenerationError {
    /// Text shown to the user in place of the previous error, if any.
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::EmptyPrompt => "Enter a prompt before generating.".to_string(),
            GenerationError::MissingCredential => {
                "API key is missing. Check that GEMINI_API_KEY is set in your environment."
                    .to_string()
            }
            GenerationError::RequestFailed { status } => format!(
                "Generation failed with HTTP status {}. Check your API key and quota.",
                status
            ),
            GenerationError::EmptyResponse => {
                "The image service returned no image. Try a different prompt.".to_string()
            }
            GenerationError::Unexpected(_) => {
                "Something went wrong while generating the icon. Please try again.".to_string()
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Export error: {0}")]
    Export(String),
}
