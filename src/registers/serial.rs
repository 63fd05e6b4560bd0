//! REG0: serial port configuration
//!
//! Bit layout (authoritative, matches the module's wire format):
//!
//! ```text
//! 7   6   5   4   3   2   1   0
//! [UART rate ] [parity] [air rate ]
//! ```
//!
//! All eight bits carry a field, so the byte is fully determined by the
//! decoded view and re-encoding is bit-exact.

/// Baud rate of the module's UART.
///
/// Transmitter and receiver may use different UART rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartBaudRate {
    /// 1200 baud
    Bps1200 = 0b000,
    /// 2400 baud
    Bps2400 = 0b001,
    /// 4800 baud
    Bps4800 = 0b010,
    /// 9600 baud (factory default)
    #[default]
    Bps9600 = 0b011,
    /// 19200 baud
    Bps19200 = 0b100,
    /// 38400 baud
    Bps38400 = 0b101,
    /// 57600 baud
    Bps57600 = 0b110,
    /// 115200 baud
    Bps115200 = 0b111,
}

impl UartBaudRate {
    /// Decodes from the three field bits. Total: every bit pattern is a
    /// distinct variant.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0b000 => Self::Bps1200,
            0b001 => Self::Bps2400,
            0b010 => Self::Bps4800,
            0b011 => Self::Bps9600,
            0b100 => Self::Bps19200,
            0b101 => Self::Bps38400,
            0b110 => Self::Bps57600,
            _ => Self::Bps115200,
        }
    }

    /// The raw field bits.
    pub fn bits(self) -> u8 {
        self as u8
    }
}

/// UART parity setting.
///
/// Must match between transmitter and receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    /// 8N1, no parity (factory default)
    #[default]
    None = 0b00,
    /// 8O1, odd parity
    Odd = 0b01,
    /// 8E1, even parity
    Even = 0b10,
    /// Duplicate wire encoding of 8N1. Kept distinct so a byte read from the
    /// module re-encodes bit-exactly.
    NoneAlt = 0b11,
}

impl Parity {
    /// Decodes from the two field bits.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::None,
            0b01 => Self::Odd,
            0b10 => Self::Even,
            _ => Self::NoneAlt,
        }
    }

    /// The raw field bits.
    pub fn bits(self) -> u8 {
        self as u8
    }
}

/// Over-the-air data rate.
///
/// Must match between transmitter and receiver. The three lowest codes all
/// select 2400 bps; they differ only in the underlying modulation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AirDataRate {
    /// 2400 bps (alternate encoding)
    Bps2400Low = 0b000,
    /// 2400 bps (alternate encoding)
    Bps2400Mid = 0b001,
    /// 2400 bps (factory default)
    #[default]
    Bps2400 = 0b010,
    /// 4800 bps
    Bps4800 = 0b011,
    /// 9600 bps
    Bps9600 = 0b100,
    /// 19200 bps
    Bps19200 = 0b101,
    /// 38400 bps
    Bps38400 = 0b110,
    /// 62500 bps
    Bps62500 = 0b111,
}

impl AirDataRate {
    /// Decodes from the three field bits.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0b000 => Self::Bps2400Low,
            0b001 => Self::Bps2400Mid,
            0b010 => Self::Bps2400,
            0b011 => Self::Bps4800,
            0b100 => Self::Bps9600,
            0b101 => Self::Bps19200,
            0b110 => Self::Bps38400,
            _ => Self::Bps62500,
        }
    }

    /// The raw field bits.
    pub fn bits(self) -> u8 {
        self as u8
    }
}

/// Decoded view of REG0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialConfig {
    /// UART baud rate, bits 7-5.
    pub uart_rate: UartBaudRate,
    /// UART parity, bits 4-3.
    pub parity: Parity,
    /// Air data rate, bits 2-0.
    pub air_rate: AirDataRate,
}

impl SerialConfig {
    /// Unpacks the register byte into its fields.
    pub fn from_byte(byte: u8) -> Self {
        Self {
            uart_rate: UartBaudRate::from_bits(byte >> 5),
            parity: Parity::from_bits(byte >> 3),
            air_rate: AirDataRate::from_bits(byte),
        }
    }

    /// Packs the fields back into the register byte.
    pub fn to_byte(self) -> u8 {
        self.uart_rate.bits() << 5 | self.parity.bits() << 3 | self.air_rate.bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_byte_value() {
        for byte in 0..=u8::MAX {
            assert_eq!(SerialConfig::from_byte(byte).to_byte(), byte);
        }
    }

    #[test]
    fn decodes_documented_field_positions() {
        // 0b110_01_010: 57600 baud, odd parity, 2400 bps air rate
        let config = SerialConfig::from_byte(0b1100_1010);
        assert_eq!(config.uart_rate, UartBaudRate::Bps57600);
        assert_eq!(config.parity, Parity::Odd);
        assert_eq!(config.air_rate, AirDataRate::Bps2400);
    }

    #[test]
    fn default_matches_factory_settings() {
        let config = SerialConfig::default();
        assert_eq!(config.uart_rate, UartBaudRate::Bps9600);
        assert_eq!(config.parity, Parity::None);
        assert_eq!(config.air_rate, AirDataRate::Bps2400);
    }

    #[test]
    fn changing_one_field_leaves_other_bits_alone() {
        let mut config = SerialConfig::from_byte(0b1010_0110);
        config.parity = Parity::Even;
        let repacked = config.to_byte();
        assert_eq!(repacked & 0b1110_0111, 0b1010_0110 & 0b1110_0111);
        assert_eq!((repacked >> 3) & 0b11, Parity::Even.bits());
    }
}
