pub mod npy;
pub mod record;
pub mod table;

pub use npy::{read_npy, write_npy, NpyError};
pub use record::{decode_row, encode_row, EncodeError};
pub use table::*;
