//! Wire protocol definitions
//!
//! The E220 speaks two unrelated protocols, both accepted only while the
//! module is in PROGRAM mode (the ambient-noise query in [`binary`] is the
//! one exception):
//!
//! - [`binary`]: the register read/write protocol. Length-prefixed request
//!   frames, fixed 4-byte responses. Covers everything except identity,
//!   reset and factory restore.
//! - [`at`]: the textual AT fallback for the operations the binary protocol
//!   does not offer: model identity, firmware identity, soft reset and
//!   factory-default restore.
//!
//! This module only builds and parses frames; the exchange itself (mode
//! management, timing, transport I/O) lives in [`crate::device`].

mod at;
mod binary;

pub use at::*;
pub use binary::*;
