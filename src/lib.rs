#![cfg_attr(not(test), no_std)]
//! EBYTE E220 Radio Module Driver
//!
//! This crate provides a type-safe interface for the EBYTE E220 series of
//! LoRa (LLCC68-based) half-duplex UART radio modules. The modules expose a
//! plain byte pipe in normal operation and a small configuration protocol in
//! a dedicated programming mode.
//!
//! # Features
//! - Operating-mode control via the M0/M1 pins, with AUX-based readiness
//!   polling (or conservative fixed delays when AUX is not wired)
//! - Full register read/write over the binary configuration protocol, with
//!   permanent or power-cycle-volatile persistence
//! - Identity, soft reset and factory restore via the textual AT fallback
//! - Ambient-noise and received-signal RSSI readout
//! - An in-memory parameter store with typed field accessors, so a
//!   configuration can be staged offline and committed in one write
//!
//! # Architecture
//! The driver is organized into several modules:
//!
//! - [`device`]: Main driver interface for hardware interaction
//!   - Owns the UART, the mode pins, the optional AUX pin and a delay source
//!   - Manages mode transitions, exchange timing and the parameter mirror
//!
//! - [`registers`]: The module's nine-byte register file
//!   - [`registers::serial`]: UART and air data rate configuration (REG0)
//!   - [`registers::transmission`]: sub-packet size and transmit power (REG1)
//!   - [`registers::operation`]: transmit policy and wake-on-radio (REG3)
//!
//! - [`commands`]: Wire protocol definitions
//!   - the binary register read/write frames
//!   - the AT command fallback for identity, reset and factory restore
//!
//! # Usage
//! The main entry point is the [`E220`] struct. Bring-up follows a fixed
//! sequence:
//!
//! 1. Create an [`E220`] from your UART, mode pins and delay source
//! 2. Call [`E220::init`] to verify the module identity and mirror its
//!    current parameters
//! 3. Stage configuration changes through the typed setters
//! 4. Commit them with [`E220::save`]
//! 5. The module is back in normal (transparent) mode; use the UART for
//!    payload traffic
//!
//! # Important Notes
//! - Setters only touch the in-memory mirror until [`E220::save`] runs
//! - Configuration exchanges only work at 9600 baud, 8N1
//! - The encryption key registers read back as zero; the staged key is
//!   write-only
//! - A failed save leaves the module's registers indeterminate relative to
//!   the local mirror; re-read before trusting local state
//!
//! # Example
//! ```no_run
//! use embedded_hal::{delay::DelayNs, digital::{InputPin, OutputPin}};
//! use embedded_io::{Read, ReadReady, Write};
//! use ebyte_e220::{E220, Error, SaveMode, registers::TransmitPower};
//!
//! fn bring_up<S, M0, M1, AUX, D>(
//!     serial: S,
//!     m0: M0,
//!     m1: M1,
//!     aux: Option<AUX>,
//!     delay: D,
//! ) -> Result<E220<S, M0, M1, AUX, D>, Error>
//! where
//!     S: Read + Write + ReadReady,
//!     M0: OutputPin,
//!     M1: OutputPin,
//!     AUX: InputPin,
//!     D: DelayNs,
//! {
//!     let mut radio = E220::new(serial, m0, m1, aux, delay);
//!     radio.init()?;
//!
//!     radio.set_address(0x1234);
//!     radio.set_channel(0x17);
//!     radio.set_transmit_power(TransmitPower::Dbm10);
//!     radio.save(SaveMode::Permanent)?;
//!
//!     Ok(radio)
//! }
//! ```

pub mod commands;
pub mod device;
pub mod error;
pub mod mode;
pub mod registers;

pub use commands::{AtCommand, SaveMode};
pub use device::E220;
pub use error::Error;
pub use mode::OperatingMode;
pub use registers::*;
