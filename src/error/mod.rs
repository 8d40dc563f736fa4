use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Gemini error: {0}")]
    Gemini(#[from] GeminiError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("Not found: {kind} {id}")]
    NotFound { kind: String, id: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database connection failed: {message}")]
    Connection { message: String },

    #[error("Query failed: {message}")]
    Query { message: String },

    #[error("Migration failed: {message}")]
    Migration { message: String },

    #[error("Serialization failed for key {key}: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Generative-language API errors
#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("Gemini unavailable: {message} (retries: {retries})")]
    Unavailable { message: String, retries: u32 },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Section drafting errors
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Invalid section for generation: {section}")]
    UnknownSection { section: String },

    #[error("Missing input for {section}: {field}")]
    MissingInput { section: String, field: String },

    #[error("Index {index} out of range for {section} (len {len})")]
    IndexOutOfRange {
        section: String,
        index: usize,
        len: usize,
    },

    #[error("The AI returned an invalid response for {section}. {message}")]
    InvalidResponse { section: String, message: String },

    #[error("Chat message cannot be empty")]
    EmptyMessage,
}

/// Import/export framing errors
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("No embedded {kind} data found in file")]
    MissingPayload { kind: String },

    #[error("Embedded {kind} data is not a JSON object")]
    NotAnObject { kind: String },

    #[error("Embedded data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for Gemini operations
pub type GeminiResult<T> = Result<T, GeminiError>;

/// Result type alias for section drafting
pub type GenerationResult<T> = Result<T, GenerationError>;

/// Result type alias for import/export
pub type TransferResult<T> = Result<T, TransferError>;
