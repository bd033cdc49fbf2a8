// Core data models for Shukatsu
// These structs represent the domain entities

pub mod company;
pub mod es;
pub mod event;
pub mod stage;

pub use company::*;
pub use es::*;
pub use event::*;
pub use stage::*;
