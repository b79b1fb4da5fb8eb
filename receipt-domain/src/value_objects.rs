// Domain value objects
pub mod scratch_file;

pub use scratch_file::*;
