//! Operating mode state machine
//!
//! The E220 selects its operating mode from the levels of the two
//! mode-select inputs M0 and M1. The mode is transient hardware state: it is
//! never persisted by the module and the driver re-asserts it around every
//! programming operation.
//!
//! | Mode      | M0   | M1   |
//! |-----------|------|------|
//! | Normal    | low  | low  |
//! | WakeUp    | high | low  |
//! | PowerDown | low  | high |
//! | Program   | high | high |
//!
//! Only [`OperatingMode::Program`] accepts configuration frames and AT
//! commands; the other three relay radio payload.

use embedded_hal::digital::PinState;

/// Operating mode of the module, selected through the M0/M1 pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperatingMode {
    /// Transparent send and receive.
    #[default]
    Normal,
    /// Like Normal, but transmissions carry a wake-up preamble for receivers
    /// sleeping in PowerDown.
    WakeUp,
    /// Low-power listen; the UART is closed until a wake-up frame arrives.
    PowerDown,
    /// Configuration mode: accepts register read/write frames and AT
    /// commands instead of relaying payload.
    Program,
}

impl OperatingMode {
    /// The (M0, M1) pin levels selecting this mode.
    pub fn pin_levels(self) -> (PinState, PinState) {
        match self {
            OperatingMode::Normal => (PinState::Low, PinState::Low),
            OperatingMode::WakeUp => (PinState::High, PinState::Low),
            OperatingMode::PowerDown => (PinState::Low, PinState::High),
            OperatingMode::Program => (PinState::High, PinState::High),
        }
    }
}
