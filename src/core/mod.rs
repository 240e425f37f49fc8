//! Shared types, errors and document validation

pub mod cancel;
pub mod error;
pub mod types;
pub mod validator;

pub use cancel::CancelToken;
pub use error::{Error, Result};
pub use types::{FileInfo, FileType, ProgressCallback};
pub use validator::{validate_file, Rejection};
