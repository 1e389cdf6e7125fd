pub mod qualifier;
pub mod formatter;
pub mod submit;

pub use qualifier::*;
pub use formatter::*;
pub use submit::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrderError {
    #[error("Order payload serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("Invalid order endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}
