//! Shared data model for alice-sh: descriptor types, their value domains and the payloads
//! exchanged with the remote platform.

pub mod capabilities;
pub mod device;
pub mod macros;
pub mod properties;

#[doc(hidden)]
pub use serde as _serde;

mod descriptor;
mod error;
mod string;
mod value;

pub use capabilities::{DescriptorType, Parameters};
pub use descriptor::*;
pub use error::*;
pub use string::*;
pub use value::*;
