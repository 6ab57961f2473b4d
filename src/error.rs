//! Application error type.
//!
//! Every fallible path in the crate returns `AppError`: a process exit code plus
//! a human-readable message. Exit codes group failures the way callers act on
//! them:
//!
//! - `2`: rejected configuration or unreadable input (fix the invocation)
//! - `3`: the data cannot support the requested search
//! - `4`: internal failure (scheduler accounting, worker loss, write errors)

/// Invalid options, seed masks, CSV/JSON input.
pub const EXIT_CONFIG: u8 = 2;
/// Not enough rows/features for the requested operation.
pub const EXIT_DATA: u8 = 3;
/// Scheduler invariant violations and output failures.
pub const EXIT_INTERNAL: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// A configuration rejected before any search work starts.
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(EXIT_CONFIG, message)
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::new(EXIT_DATA, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(EXIT_INTERNAL, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
