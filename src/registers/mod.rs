//! Register definitions and bit-packing codecs
//!
//! The E220 exposes its configuration as nine addressable byte registers:
//!
//! | Index | Register  | Contents                                   |
//! |-------|-----------|--------------------------------------------|
//! | 0     | ADDH      | Module address, high byte                  |
//! | 1     | ADDL      | Module address, low byte                   |
//! | 2     | REG0      | UART rate, parity, air data rate           |
//! | 3     | REG1      | Packet size, RSSI options, transmit power  |
//! | 4     | REG2      | Channel number (raw byte)                  |
//! | 5     | REG3      | RSSI byte, transmit method, LBT, WOR cycle |
//! | 6     | CRYPT_H   | Encryption key, high byte (write-only)     |
//! | 7     | CRYPT_L   | Encryption key, low byte (write-only)      |
//! | 8     | PRODINFO  | Product information (read-only)            |
//!
//! [`RegisterFile`] mirrors the nine bytes and is the single source of truth
//! for the decoded views; the typed accessors decode on demand and the typed
//! setters immediately re-pack the owning byte, so the two representations
//! cannot diverge.
//!
//! Everything in this module is pure: no I/O, no timing.

pub mod operation;
pub mod serial;
pub mod transmission;

pub use operation::*;
pub use serial::*;
pub use transmission::*;

/// In-memory mirror of the module's nine configuration registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterFile {
    bytes: [u8; Self::LEN],
}

impl RegisterFile {
    /// Number of addressable registers.
    pub const LEN: usize = 9;

    /// Number of registers carried by a full write frame. The trailing
    /// PRODINFO register is read-only and never written.
    pub const WRITABLE_LEN: usize = 8;

    /// Raw register bytes, in wire order.
    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.bytes
    }

    /// The eight writable register bytes, in the fixed order expected by a
    /// full write frame.
    pub fn writable_bytes(&self) -> [u8; Self::WRITABLE_LEN] {
        let mut out = [0; Self::WRITABLE_LEN];
        out.copy_from_slice(&self.bytes[..Self::WRITABLE_LEN]);
        out
    }

    /// High byte of the 16-bit module address.
    pub fn address_high(&self) -> u8 {
        self.bytes[0]
    }

    /// Low byte of the 16-bit module address.
    pub fn address_low(&self) -> u8 {
        self.bytes[1]
    }

    /// The 16-bit module address, `(ADDH << 8) | ADDL`.
    pub fn address(&self) -> u16 {
        u16::from_be_bytes([self.bytes[0], self.bytes[1]])
    }

    pub fn set_address_high(&mut self, value: u8) {
        self.bytes[0] = value;
    }

    pub fn set_address_low(&mut self, value: u8) {
        self.bytes[1] = value;
    }

    pub fn set_address(&mut self, address: u16) {
        let [high, low] = address.to_be_bytes();
        self.bytes[0] = high;
        self.bytes[1] = low;
    }

    /// Decoded view of REG0.
    pub fn serial(&self) -> SerialConfig {
        SerialConfig::from_byte(self.bytes[2])
    }

    /// Re-packs REG0 from the given view.
    pub fn set_serial(&mut self, config: SerialConfig) {
        self.bytes[2] = config.to_byte();
    }

    /// Decoded view of REG1.
    pub fn transmission(&self) -> TransmissionConfig {
        TransmissionConfig::from_byte(self.bytes[3])
    }

    /// Re-packs REG1 from the given view, preserving its reserved bits.
    pub fn set_transmission(&mut self, config: TransmissionConfig) {
        self.bytes[3] = config.to_byte(self.bytes[3]);
    }

    /// Channel number (raw REG2 byte).
    pub fn channel(&self) -> u8 {
        self.bytes[4]
    }

    pub fn set_channel(&mut self, channel: u8) {
        self.bytes[4] = channel;
    }

    /// Decoded view of REG3.
    pub fn operation(&self) -> OperationConfig {
        OperationConfig::from_byte(self.bytes[5])
    }

    /// Re-packs REG3 from the given view, preserving its reserved bits.
    pub fn set_operation(&mut self, config: OperationConfig) {
        self.bytes[5] = config.to_byte(self.bytes[5]);
    }

    /// Sets the high byte of the 16-bit encryption key.
    ///
    /// The CRYPT registers are write-only from the module's perspective: any
    /// read returns zero, so this value cannot be verified by a later read.
    pub fn set_crypt_high(&mut self, value: u8) {
        self.bytes[6] = value;
    }

    /// Sets the low byte of the 16-bit encryption key. Write-only, like
    /// [`set_crypt_high`](Self::set_crypt_high).
    pub fn set_crypt_low(&mut self, value: u8) {
        self.bytes[7] = value;
    }

    /// Product information byte. Read-only.
    pub fn product_info(&self) -> u8 {
        self.bytes[8]
    }
}

impl From<[u8; RegisterFile::LEN]> for RegisterFile {
    fn from(bytes: [u8; RegisterFile::LEN]) -> Self {
        Self { bytes }
    }
}
