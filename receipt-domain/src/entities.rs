// Domain entities

pub mod config;
pub mod receipt;
pub mod storage_event;

pub use config::*;
pub use receipt::*;
pub use storage_event::*;
