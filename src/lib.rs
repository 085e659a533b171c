#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod clock;
pub use clock::{Clock, SystemClock};

#[cfg(any(test, feature = "testing"))]
pub use clock::ManualClock;

pub mod local;
pub use local::*;

mod window;

mod error;
pub use error::*;

mod common;
pub use common::{HopUnit, HoppingWindowOptions, WindowUnits};

#[cfg(test)]
mod tests;
