//! Typed recording data model
//!
//! A recording holds one [`SignalTable`] per modality. Each row identifies a
//! (surgery, timestamp, channel) triplet and carries the waveform, its
//! baseline and sampling metadata. Rows are plain structs with an explicit
//! schema rather than loosely-typed columns.

pub mod table;
pub mod types;

pub use table::{SignalTable, SurgeryCatalog, SurgeryMeta};
pub use types::{Region, SignalRow, SurgeryId, Timestamp};
