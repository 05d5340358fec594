pub mod engine;
pub mod weights;

pub use engine::*;
pub use weights::*;
