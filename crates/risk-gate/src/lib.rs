pub mod config;
pub mod correlation;
pub mod gate;
pub mod session;

pub use config::*;
pub use correlation::*;
pub use gate::*;
pub use session::*;
