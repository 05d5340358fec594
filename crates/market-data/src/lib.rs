pub mod fetcher;
pub mod retry;

pub use fetcher::*;
pub use retry::*;
