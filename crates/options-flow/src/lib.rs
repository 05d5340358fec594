pub mod analytics;
pub mod producer;

pub use analytics::*;
pub use producer::*;
