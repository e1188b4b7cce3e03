//! Strata Frame
//!
//! The tabular value owned by every strata table once it is populated.
//!
//! A [`Frame`] is an ordered set of named columns, each a vector of
//! `serde_json::Value` cells of the same length. Frames serialize as an array
//! of JSON objects (records), keeping the column order.

mod error;
mod frame;
mod key;

pub use error::FrameError;
pub use frame::Frame;
pub use key::RowKey;
