pub mod commands;
pub mod commands_es;
pub mod dashboard;
pub mod error;
pub mod output;

pub use commands::*;
pub use output::*;
pub use error::*;
