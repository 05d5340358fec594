pub mod history;
pub mod journal;

pub use history::*;
pub use journal::*;
