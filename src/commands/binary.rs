//! Binary register read/write protocol
//!
//! A request frame is an opcode byte, a register start index and a length,
//! followed by `length` payload bytes for writes:
//!
//! ```text
//! [opcode:1][start:1][length:1]{payload:length}
//! ```
//!
//! The module always answers register operations with exactly four bytes:
//!
//! ```text
//! [opcode:1][start:1][length:1][payload:1]
//! ```
//!
//! A full parameter read is nine single-byte reads at indices 0..=8 rather
//! than one multi-byte read: some registers answer differently when read in
//! isolation (the slot at index 5 doubles as signal-strength status), so the
//! reads must not be coalesced.

use crate::registers::RegisterFile;

/// Opcode for a register read request.
pub const OPCODE_READ: u8 = 0xC1;

/// Opcode for a register write that survives power cycling.
pub const OPCODE_WRITE_PERMANENT: u8 = 0xC0;

/// Opcode for a register write that is lost on power cycling.
pub const OPCODE_WRITE_TEMPORARY: u8 = 0xC2;

/// Opcode echoed by the module on a successful operation.
pub const RESPONSE_OK: u8 = 0xC1;

/// Size of a register operation response, always exactly four bytes.
pub const RESPONSE_LEN: usize = 4;

/// Ambient-noise RSSI query. Unlike register operations this is issued in
/// NORMAL mode; the answer is a standard 4-byte response frame whose payload
/// byte carries the noise reading.
pub const AMBIENT_RSSI_REQUEST: [u8; 6] = [0xC0, 0xC1, 0xC2, 0xC3, 0x00, 0x02];

/// Persistence of a full register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SaveMode {
    /// Parameters are stored in the module's non-volatile memory and survive
    /// power cycling.
    Permanent,
    /// Parameters apply immediately but revert on power cycling. Preferred
    /// when the address or channel changes frequently, to spare the flash.
    Temporary,
}

impl SaveMode {
    /// The write opcode selecting this persistence.
    pub fn opcode(self) -> u8 {
        match self {
            SaveMode::Permanent => OPCODE_WRITE_PERMANENT,
            SaveMode::Temporary => OPCODE_WRITE_TEMPORARY,
        }
    }
}

/// Builds a single-register read request for the given register index.
pub fn read_request(index: u8) -> [u8; 3] {
    [OPCODE_READ, index, 0x01]
}

/// Builds a full write frame carrying the eight writable register bytes in
/// fixed wire order.
pub fn write_request(
    mode: SaveMode,
    registers: [u8; RegisterFile::WRITABLE_LEN],
) -> [u8; 3 + RegisterFile::WRITABLE_LEN] {
    let mut frame = [0; 3 + RegisterFile::WRITABLE_LEN];
    frame[0] = mode.opcode();
    frame[1] = 0x00;
    frame[2] = RegisterFile::WRITABLE_LEN as u8;
    frame[3..].copy_from_slice(&registers);
    frame
}

/// A parsed 4-byte response frame.
///
/// The echoed start index is deliberately not validated anywhere: the module
/// echoes zero regardless of the index that was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResponseFrame {
    /// Echoed opcode; [`RESPONSE_OK`] signals success.
    pub opcode: u8,
    /// Echoed register start index.
    pub start: u8,
    /// Echoed payload length.
    pub length: u8,
    /// The single payload byte.
    pub payload: u8,
}

impl ResponseFrame {
    /// Parses the fixed 4-byte wire form.
    pub fn from_bytes(bytes: [u8; RESPONSE_LEN]) -> Self {
        Self {
            opcode: bytes[0],
            start: bytes[1],
            length: bytes[2],
            payload: bytes[3],
        }
    }

    /// Whether the module echoed the success opcode.
    pub fn is_ok(&self) -> bool {
        self.opcode == RESPONSE_OK
    }
}
