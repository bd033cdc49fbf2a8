pub mod attachment;
pub mod date;

pub use attachment::*;
pub use date::*;
