mod response;
pub use response::{serialize_json, error_json};

pub mod error;
pub use error::{ApiError, ApiErrorKind, Detail};

pub mod fs;
pub mod workspace;
