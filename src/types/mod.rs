//! Value types shared by the table core and its collaborators.

mod anchor;
mod command;
mod range;

pub use anchor::*;
pub use command::*;
pub use range::*;
