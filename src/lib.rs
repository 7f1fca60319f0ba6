#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

mod element;
mod error;
mod forest;
mod heap;
mod id;
mod identity;
mod partition;
mod position;
mod range;
mod schedule;
mod value;

pub use element::*;
pub use error::*;
pub use forest::*;
pub use heap::*;
pub use id::*;
pub use identity::*;
pub use partition::*;
pub use position::*;
pub use range::*;
pub use schedule::*;
pub use value::*;
