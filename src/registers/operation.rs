//! REG3: transmit policy and low-power configuration
//!
//! Bit layout (authoritative, matches the module's wire format):
//!
//! ```text
//! 7   6   5   4   3   2   1   0
//! SIG MTH res LBT res [WOR cycle]
//! ```
//!
//! Bits 5 and 3 are reserved. Re-encoding preserves them from the previous
//! byte value.

/// How payload bytes written to the UART are addressed over the air.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransmitMethod {
    /// Transparent transmission: payload is relayed as-is to every module on
    /// the same address and channel (factory default).
    #[default]
    Transparent = 0b0,
    /// Fixed-point transmission: the first three payload bytes name the
    /// target address and channel.
    Fixed = 0b1,
}

impl TransmitMethod {
    /// Decodes from the single field bit.
    pub fn from_bits(bits: u8) -> Self {
        if bits & 0b1 != 0 {
            Self::Fixed
        } else {
            Self::Transparent
        }
    }

    /// The raw field bit.
    pub fn bits(self) -> u8 {
        self as u8
    }
}

/// Wake-on-radio listen cycle period.
///
/// Governs how often a module in power-down mode wakes to listen, and the
/// wake-up preamble length used by transmitters in wake-up mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WorCycle {
    /// 500 ms (factory default)
    #[default]
    Ms500 = 0b000,
    /// 1000 ms
    Ms1000 = 0b001,
    /// 1500 ms
    Ms1500 = 0b010,
    /// 2000 ms
    Ms2000 = 0b011,
    /// 2500 ms
    Ms2500 = 0b100,
    /// 3000 ms
    Ms3000 = 0b101,
    /// 3500 ms
    Ms3500 = 0b110,
    /// 4000 ms
    Ms4000 = 0b111,
}

impl WorCycle {
    /// Decodes from the three field bits.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0b000 => Self::Ms500,
            0b001 => Self::Ms1000,
            0b010 => Self::Ms1500,
            0b011 => Self::Ms2000,
            0b100 => Self::Ms2500,
            0b101 => Self::Ms3000,
            0b110 => Self::Ms3500,
            _ => Self::Ms4000,
        }
    }

    /// The raw field bits.
    pub fn bits(self) -> u8 {
        self as u8
    }
}

/// Decoded view of REG3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OperationConfig {
    /// Signal-RSSI byte enable, bit 7. When set, the module appends an RSSI
    /// byte after each received payload.
    pub signal_rssi: bool,
    /// Transmission method, bit 6.
    pub method: TransmitMethod,
    /// Listen-before-talk enable, bit 4. When set, the module checks channel
    /// occupancy before transmitting.
    pub lbt: bool,
    /// Wake-on-radio cycle, bits 2-0.
    pub wor_cycle: WorCycle,
}

impl OperationConfig {
    /// Mask of the bits owned by the decoded fields; the complement is
    /// reserved.
    const FIELD_MASK: u8 = 0b1101_0111;

    /// Unpacks the register byte into its fields.
    pub fn from_byte(byte: u8) -> Self {
        Self {
            signal_rssi: byte & (1 << 7) != 0,
            method: TransmitMethod::from_bits(byte >> 6),
            lbt: byte & (1 << 4) != 0,
            wor_cycle: WorCycle::from_bits(byte),
        }
    }

    /// Packs the fields back into the register byte, taking the reserved
    /// bits from `previous`.
    pub fn to_byte(self, previous: u8) -> u8 {
        let fields = u8::from(self.signal_rssi) << 7
            | self.method.bits() << 6
            | u8::from(self.lbt) << 4
            | self.wor_cycle.bits();
        previous & !Self::FIELD_MASK | fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reencoding_preserves_every_byte_value() {
        for byte in 0..=u8::MAX {
            let repacked = OperationConfig::from_byte(byte).to_byte(byte);
            assert_eq!(repacked, byte);
        }
    }

    #[test]
    fn decodes_documented_field_positions() {
        // 0b1_1_0_1_0_011: RSSI byte on, fixed-point, LBT on, 2000 ms WOR
        let config = OperationConfig::from_byte(0b1101_0011);
        assert!(config.signal_rssi);
        assert_eq!(config.method, TransmitMethod::Fixed);
        assert!(config.lbt);
        assert_eq!(config.wor_cycle, WorCycle::Ms2000);
    }

    #[test]
    fn field_change_touches_only_owned_bits() {
        let previous = 0b0010_1000; // both reserved bits set
        let mut config = OperationConfig::from_byte(previous);
        config.lbt = true;

        let repacked = config.to_byte(previous);
        assert_eq!(repacked & 0b0010_1000, previous & 0b0010_1000);
        assert_eq!(repacked, previous | 1 << 4);
    }
}
