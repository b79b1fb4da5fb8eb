pub mod object_fetcher;
pub mod vision_extractor;

pub use object_fetcher::*;
pub use vision_extractor::*;
