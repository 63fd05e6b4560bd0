//! Driver error taxonomy
//!
//! All fallible operations in this crate report one of the variants below.
//! Transport and pin failures are collapsed into [`Error::Bus`] and
//! [`Error::Pin`]; the underlying HAL error types vary per platform and the
//! module protocol gives no way to recover from them anyway.

use thiserror::Error;

/// Errors returned by the E220 driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A read from or write to the serial transport failed.
    #[error("serial transport error")]
    Bus,

    /// Driving a mode-select pin or sampling the AUX pin failed.
    #[error("mode pin error")]
    Pin,

    /// The module produced no response, or an incomplete response, within the
    /// bounded wait.
    ///
    /// The wait only bounds how long the driver listens. The module may still
    /// complete the operation afterwards, so callers should re-read the
    /// parameters before trusting local state again.
    #[error("module did not respond within the allotted time")]
    ModuleUnresponsive,

    /// A response was received but its echoed opcode or textual prefix did
    /// not match what the operation expects.
    #[error("unexpected response from module")]
    UnexpectedResponse,

    /// The model identity string reported by the module does not belong to
    /// the E220 family. Fatal to initialization.
    #[error("module identity is not an E220")]
    IdentityMismatch,

    /// An RSSI readout was requested while the corresponding RSSI enable flag
    /// is off in the local register mirror.
    #[error("RSSI reporting is not enabled")]
    RssiDisabled,
}
