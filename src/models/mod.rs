pub mod enums;
pub mod note;

pub use enums::*;
pub use note::*;
