pub mod shapes;
pub mod tables;
pub mod types;

pub use shapes::*;
pub use tables::*;
pub use types::*;
