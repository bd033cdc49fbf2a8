pub mod company;
pub mod es;
pub mod event;

pub use company::*;
pub use es::*;
pub use event::*;
