pub mod allocator;
pub mod flatten;
pub mod record;
pub mod value;

pub use allocator::*;
pub use flatten::*;
pub use record::*;
pub use value::*;
