pub mod error;
pub mod time;

pub use error::{TsdbError, Result};
pub use time::*;
