pub mod error;
pub mod market;
pub mod tally;
pub mod traits;
pub mod types;

pub use error::*;
pub use market::*;
pub use tally::*;
pub use traits::*;
pub use types::*;
