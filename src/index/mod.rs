pub mod hash;

pub use hash::{HashIndex, SearchKey};
