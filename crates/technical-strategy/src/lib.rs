pub mod indicators;
pub mod intraday;
pub mod swing;

mod indicators_tests;

pub use indicators::*;
pub use intraday::*;
pub use swing::*;
