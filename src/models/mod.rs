pub mod enums;
pub mod document;
pub mod summary;
pub mod structured;
pub mod result;

pub use enums::*;
pub use document::*;
pub use summary::*;
pub use structured::*;
pub use result::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid value for {field}: {value}")]
    InvalidEnum { field: String, value: String },
}
