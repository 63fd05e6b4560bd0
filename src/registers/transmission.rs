//! REG1: packet and power configuration
//!
//! Bit layout (authoritative, matches the module's wire format):
//!
//! ```text
//! 7   6   5   4   3   2   1   0
//! [size ] AMB res SWS res [power]
//! ```
//!
//! Bits 4 and 2 are reserved. Re-encoding preserves them from the previous
//! byte value so a field update never disturbs bits it does not own.

/// Maximum payload bytes per over-the-air sub-packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketSize {
    /// 200 bytes (factory default)
    #[default]
    Bytes200 = 0b00,
    /// 128 bytes
    Bytes128 = 0b01,
    /// 64 bytes
    Bytes64 = 0b10,
    /// 32 bytes
    Bytes32 = 0b11,
}

impl PacketSize {
    /// Decodes from the two field bits.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::Bytes200,
            0b01 => Self::Bytes128,
            0b10 => Self::Bytes64,
            _ => Self::Bytes32,
        }
    }

    /// The raw field bits.
    pub fn bits(self) -> u8 {
        self as u8
    }
}

/// Transmit power level.
///
/// The dBm figures apply to the 22 dBm (xxT22) hardware variant; the xxT30
/// variant maps the same codes to 30/27/24/21 dBm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransmitPower {
    /// 22 dBm (factory default)
    #[default]
    Dbm22 = 0b00,
    /// 17 dBm
    Dbm17 = 0b01,
    /// 13 dBm
    Dbm13 = 0b10,
    /// 10 dBm
    Dbm10 = 0b11,
}

impl TransmitPower {
    /// Decodes from the two field bits.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::Dbm22,
            0b01 => Self::Dbm17,
            0b10 => Self::Dbm13,
            _ => Self::Dbm10,
        }
    }

    /// The raw field bits.
    pub fn bits(self) -> u8 {
        self as u8
    }
}

/// Decoded view of REG1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransmissionConfig {
    /// Sub-packet size, bits 7-6.
    pub packet_size: PacketSize,
    /// Ambient-noise RSSI reporting enable, bit 5. When set, the module
    /// answers the ambient-noise query issued in normal mode.
    pub ambient_rssi: bool,
    /// Software mode switching enable, bit 3.
    pub software_mode_switch: bool,
    /// Transmit power, bits 1-0.
    pub power: TransmitPower,
}

impl TransmissionConfig {
    /// Mask of the bits owned by the decoded fields. The complement is
    /// reserved and carried through unchanged on re-encode.
    const FIELD_MASK: u8 = 0b1110_1011;

    /// Unpacks the register byte into its fields. Reserved bits are dropped
    /// here and recovered from the previous byte on re-encode.
    pub fn from_byte(byte: u8) -> Self {
        Self {
            packet_size: PacketSize::from_bits(byte >> 6),
            ambient_rssi: byte & (1 << 5) != 0,
            software_mode_switch: byte & (1 << 3) != 0,
            power: TransmitPower::from_bits(byte),
        }
    }

    /// Packs the fields back into the register byte, taking the reserved
    /// bits from `previous`.
    pub fn to_byte(self, previous: u8) -> u8 {
        let fields = self.packet_size.bits() << 6
            | u8::from(self.ambient_rssi) << 5
            | u8::from(self.software_mode_switch) << 3
            | self.power.bits();
        previous & !Self::FIELD_MASK | fields
    }
}
