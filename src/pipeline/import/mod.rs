pub mod capabilities;
pub mod format;

pub use capabilities::*;
pub use format::*;
