//! E220 device interface
//!
//! This module provides the owned driver instance for the E220 module. It
//! wraps the byte transport (the module's UART), the two mode-select output
//! pins, the optional AUX ready input and a delay source, and exposes:
//!
//! - operating-mode control with the settle timing the module requires,
//! - a full register read/write cycle over the binary protocol,
//! - the AT fallback operations (identity, reset, factory restore),
//! - an in-memory parameter store with infallible setters.
//!
//! # Usage
//!
//! Setters only touch the in-memory register mirror; nothing reaches the
//! hardware until [`save`](E220::save) is called. [`init`](E220::init) must
//! run once before any getter is trusted.
//!
//! All operations are synchronous and blocking, and the driver assumes
//! exclusive ownership of the transport and pins. A request/response
//! exchange is never interleaved with a mode change.

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};
use embedded_io::{Read, ReadReady, Write};
use heapless::{String, Vec};

use crate::{
    commands::{
        self, AtCommand, ResponseFrame, SaveMode, AMBIENT_RSSI_REQUEST, AT_OK, AT_TERMINATOR,
        MAX_RESPONSE_LEN,
    },
    error::Error,
    mode::OperatingMode,
    registers::{
        AirDataRate, OperationConfig, PacketSize, Parity, RegisterFile, SerialConfig,
        TransmissionConfig, TransmitMethod, TransmitPower, UartBaudRate, WorCycle,
    },
};

/// Settle delay driven before and after asserting new mode-pin levels. The
/// datasheet claims 2 ms; real modules need far more before they react.
const MODE_SETTLE_MS: u32 = 50;

/// Upper bound on waiting for AUX after a mode change.
const MODE_SWITCH_TIMEOUT_MS: u32 = 4_000;

/// AUX poll interval while waiting for ready.
const READY_POLL_INTERVAL_MS: u32 = 2;

/// Substitute settle time when no AUX pin is wired up. Conservative enough
/// to cover the module's worst-case internal latency.
const NO_AUX_SETTLE_MS: u32 = 1_000;

/// Upper bound on waiting for response bytes of a binary exchange.
const RESPONSE_TIMEOUT_MS: u32 = 1_000;

/// Overall deadline for an AT response. The datasheet quotes 30 ms.
const AT_RESPONSE_TIMEOUT_MS: u32 = 100;

/// Transport poll interval while waiting for response bytes.
const RESPONSE_POLL_INTERVAL_MS: u32 = 1;

/// Settle time before reading the RSSI byte a sender appends to a payload.
const SIGNAL_RSSI_DELAY_MS: u32 = 10;

/// Ceiling on stale bytes drained from the transport on a mode change.
const FLUSH_LIMIT: usize = 256;

/// Base frequency of the E220-900 family. The channel number offsets from
/// this in 1 MHz steps.
const DEFAULT_BASE_FREQUENCY_MHZ: f32 = 850.125;

/// Expected prefix of the model identity string.
const MODEL_FAMILY: &str = "E220";

/// Driver instance for an E220 module.
///
/// Owns the UART transport `S`, the M0/M1 mode-select outputs, an optional
/// AUX ready input and a delay source. Without AUX the driver falls back to
/// fixed conservative delays after each mode change.
pub struct E220<S, M0, M1, AUX, D> {
    serial: S,
    m0: M0,
    m1: M1,
    aux: Option<AUX>,
    delay: D,
    mode: OperatingMode,
    registers: RegisterFile,
    model: String<MAX_RESPONSE_LEN>,
    version: String<MAX_RESPONSE_LEN>,
    base_frequency_mhz: f32,
}

impl<S, M0, M1, AUX, D> E220<S, M0, M1, AUX, D> {
    /// Creates a new driver instance from the hardware handles.
    ///
    /// Pass `None` for `aux` when the ready line is not wired; mode changes
    /// then use a fixed conservative delay instead of polling.
    pub fn new(serial: S, m0: M0, m1: M1, aux: Option<AUX>, delay: D) -> Self {
        Self {
            serial,
            m0,
            m1,
            aux,
            delay,
            mode: OperatingMode::Normal,
            registers: RegisterFile::default(),
            model: String::new(),
            version: String::new(),
            base_frequency_mhz: DEFAULT_BASE_FREQUENCY_MHZ,
        }
    }

    /// Overrides the base frequency used to derive the transmit frequency.
    ///
    /// Defaults to 850.125 MHz (E220-900 family); the 400 MHz family sits at
    /// 410.125 MHz.
    pub fn with_base_frequency(mut self, mhz: f32) -> Self {
        self.base_frequency_mhz = mhz;
        self
    }

    /// Releases the underlying hardware handles.
    pub fn release(self) -> (S, M0, M1, Option<AUX>, D) {
        (self.serial, self.m0, self.m1, self.aux, self.delay)
    }

    /// The mode most recently asserted on the M0/M1 pins.
    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    /// The in-memory register mirror.
    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    /// Model identity string, cached by [`init`](E220::init). Empty before.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Firmware identity string, cached by [`init`](E220::init).
    pub fn firmware_version(&self) -> &str {
        &self.version
    }

    /// The 16-bit module address.
    pub fn address(&self) -> u16 {
        self.registers.address()
    }

    /// High byte of the module address.
    pub fn address_high(&self) -> u8 {
        self.registers.address_high()
    }

    /// Low byte of the module address.
    pub fn address_low(&self) -> u8 {
        self.registers.address_low()
    }

    /// Channel number.
    pub fn channel(&self) -> u8 {
        self.registers.channel()
    }

    /// Decoded serial-port configuration (REG0).
    pub fn serial_config(&self) -> SerialConfig {
        self.registers.serial()
    }

    /// Decoded packet/power configuration (REG1).
    pub fn transmission_config(&self) -> TransmissionConfig {
        self.registers.transmission()
    }

    /// Decoded transmit-policy configuration (REG3).
    pub fn operation_config(&self) -> OperationConfig {
        self.registers.operation()
    }

    /// Product information byte. Read-only.
    pub fn product_info(&self) -> u8 {
        self.registers.product_info()
    }

    /// Transmit frequency in MHz, derived as base frequency plus channel.
    /// Not a register field; never written back to the module.
    pub fn transmit_frequency_mhz(&self) -> f32 {
        self.base_frequency_mhz + f32::from(self.registers.channel())
    }

    /// Sets the 16-bit module address.
    pub fn set_address(&mut self, address: u16) {
        self.registers.set_address(address);
    }

    /// Sets the high byte of the module address.
    pub fn set_address_high(&mut self, value: u8) {
        self.registers.set_address_high(value);
    }

    /// Sets the low byte of the module address.
    pub fn set_address_low(&mut self, value: u8) {
        self.registers.set_address_low(value);
    }

    /// Sets the UART baud rate code.
    pub fn set_uart_rate(&mut self, rate: UartBaudRate) {
        let mut serial = self.registers.serial();
        serial.uart_rate = rate;
        self.registers.set_serial(serial);
    }

    /// Sets the UART parity code.
    pub fn set_parity(&mut self, parity: Parity) {
        let mut serial = self.registers.serial();
        serial.parity = parity;
        self.registers.set_serial(serial);
    }

    /// Sets the air data rate code.
    pub fn set_air_rate(&mut self, rate: AirDataRate) {
        let mut serial = self.registers.serial();
        serial.air_rate = rate;
        self.registers.set_serial(serial);
    }

    /// Sets the over-the-air sub-packet size.
    pub fn set_packet_size(&mut self, size: PacketSize) {
        let mut transmission = self.registers.transmission();
        transmission.packet_size = size;
        self.registers.set_transmission(transmission);
    }

    /// Enables or disables ambient-noise RSSI reporting.
    pub fn set_ambient_rssi(&mut self, enabled: bool) {
        let mut transmission = self.registers.transmission();
        transmission.ambient_rssi = enabled;
        self.registers.set_transmission(transmission);
    }

    /// Enables or disables software mode switching.
    pub fn set_software_mode_switch(&mut self, enabled: bool) {
        let mut transmission = self.registers.transmission();
        transmission.software_mode_switch = enabled;
        self.registers.set_transmission(transmission);
    }

    /// Sets the transmit power code.
    pub fn set_transmit_power(&mut self, power: TransmitPower) {
        let mut transmission = self.registers.transmission();
        transmission.power = power;
        self.registers.set_transmission(transmission);
    }

    /// Sets the channel number.
    pub fn set_channel(&mut self, channel: u8) {
        self.registers.set_channel(channel);
    }

    /// Enables or disables the RSSI byte appended to received payloads.
    pub fn set_signal_rssi(&mut self, enabled: bool) {
        let mut operation = self.registers.operation();
        operation.signal_rssi = enabled;
        self.registers.set_operation(operation);
    }

    /// Sets the transmission method.
    pub fn set_transmit_method(&mut self, method: TransmitMethod) {
        let mut operation = self.registers.operation();
        operation.method = method;
        self.registers.set_operation(operation);
    }

    /// Enables or disables listen-before-talk.
    pub fn set_lbt(&mut self, enabled: bool) {
        let mut operation = self.registers.operation();
        operation.lbt = enabled;
        self.registers.set_operation(operation);
    }

    /// Sets the wake-on-radio cycle.
    pub fn set_wor_cycle(&mut self, cycle: WorCycle) {
        let mut operation = self.registers.operation();
        operation.wor_cycle = cycle;
        self.registers.set_operation(operation);
    }

    /// Sets the 16-bit encryption key. Write-only: the module reads the
    /// CRYPT registers back as zero, so the key cannot be verified later.
    pub fn set_encryption_key(&mut self, key: u16) {
        let [high, low] = key.to_be_bytes();
        self.registers.set_crypt_high(high);
        self.registers.set_crypt_low(low);
    }
}

impl<S, M0, M1, AUX, D> E220<S, M0, M1, AUX, D>
where
    S: Read + Write + ReadReady,
    M0: OutputPin,
    M1: OutputPin,
    AUX: InputPin,
    D: DelayNs,
{
    /// Initializes the driver: asserts NORMAL mode, queries the module's
    /// identity and performs a full register read.
    ///
    /// Must be called once before any getter is trusted.
    ///
    /// # Errors
    /// * [`Error::IdentityMismatch`] - the module is not an E220
    /// * [`Error::ModuleUnresponsive`] - no response within the bounded wait
    /// * [`Error::UnexpectedResponse`] - a response failed validation
    pub fn init(&mut self) -> Result<(), Error> {
        self.set_mode(OperatingMode::Normal)?;
        self.read_model()?;
        self.read_firmware_version()?;
        self.read_parameters()
    }

    /// Drives the M0/M1 pins to the combination for `mode`.
    ///
    /// A settle delay is taken before asserting the new levels (changing
    /// pins mid-operation corrupts the module's state) and again after,
    /// because the module's reaction time exceeds what AUX reports. Stale
    /// transport bytes are then flushed and the ready line is awaited.
    ///
    /// The ready wait is best-effort: a timeout does not fail the call.
    pub fn set_mode(&mut self, mode: OperatingMode) -> Result<(), Error> {
        self.delay.delay_ms(MODE_SETTLE_MS);

        let (m0, m1) = mode.pin_levels();
        self.m0.set_state(m0).map_err(|_| Error::Pin)?;
        self.m1.set_state(m1).map_err(|_| Error::Pin)?;

        self.delay.delay_ms(MODE_SETTLE_MS);

        // Residual response bytes from a prior operation corrupt the next
        // read, so drain them before anyone looks at the transport.
        self.flush_transport();
        self.await_ready(MODE_SWITCH_TIMEOUT_MS);

        self.mode = mode;
        Ok(())
    }

    /// Samples the AUX ready line. `None` when no AUX pin is configured or
    /// the pin read fails.
    pub fn aux_ready(&mut self) -> Option<bool> {
        self.aux.as_mut().and_then(|pin| pin.is_high().ok())
    }

    /// Performs a full register read and refreshes the in-memory mirror.
    ///
    /// Issues nine single-byte reads rather than one multi-byte read: some
    /// registers answer differently when read in isolation, so the reads
    /// must not be coalesced. Every response is validated individually.
    ///
    /// The module is left in NORMAL mode regardless of the outcome.
    pub fn read_parameters(&mut self) -> Result<(), Error> {
        self.set_mode(OperatingMode::Program)?;
        let result = self.read_all_registers();
        let restore = self.set_mode(OperatingMode::Normal);
        result.and(restore)
    }

    /// Commits the in-memory parameters to the module.
    ///
    /// The result reflects the module's acknowledgement, not local state
    /// validity. On failure the module's registers are indeterminate
    /// relative to the local mirror; re-read before trusting local state.
    ///
    /// The module is left in NORMAL mode regardless of the outcome.
    pub fn save(&mut self, mode: SaveMode) -> Result<(), Error> {
        self.set_mode(OperatingMode::Program)?;
        let result = self.write_all_registers(mode);
        let restore = self.set_mode(OperatingMode::Normal);
        result.and(restore)
    }

    /// Soft-reboots the module via `AT+RESET`.
    ///
    /// The module is left in NORMAL mode regardless of the outcome.
    pub fn reset(&mut self) -> Result<(), Error> {
        let response = self.at_exchange(AtCommand::Reset)?;
        if response.starts_with(AT_OK) {
            Ok(())
        } else {
            Err(Error::UnexpectedResponse)
        }
    }

    /// Restores the module's factory default parameters via `AT+DEFAULT`,
    /// then re-reads the register file so the local mirror matches.
    pub fn restore_defaults(&mut self) -> Result<(), Error> {
        let response = self.at_exchange(AtCommand::RestoreDefaults)?;
        if !response.starts_with(AT_OK) {
            return Err(Error::UnexpectedResponse);
        }
        self.read_parameters()
    }

    /// Reads the ambient-noise RSSI in dBm.
    ///
    /// Issued in NORMAL mode; requires the REG1 ambient-noise flag to be
    /// enabled (and saved) beforehand.
    ///
    /// # Errors
    /// * [`Error::RssiDisabled`] - the local mirror has the flag off
    pub fn read_ambient_rssi(&mut self) -> Result<i16, Error> {
        if !self.registers.transmission().ambient_rssi {
            return Err(Error::RssiDisabled);
        }

        let response = self.transfer(&AMBIENT_RSSI_REQUEST)?;
        if !response.is_ok() {
            return Err(Error::UnexpectedResponse);
        }
        Ok(rssi_dbm(response.payload))
    }

    /// Reads the signal-strength byte a sender appends after a received
    /// payload, in dBm.
    ///
    /// Issued in NORMAL mode, directly after receiving a payload; requires
    /// the REG3 signal-RSSI flag to be enabled (and saved) beforehand.
    ///
    /// # Errors
    /// * [`Error::RssiDisabled`] - the local mirror has the flag off
    pub fn read_signal_rssi(&mut self) -> Result<i16, Error> {
        if !self.registers.operation().signal_rssi {
            return Err(Error::RssiDisabled);
        }

        // The byte trails the payload by a moment.
        self.delay.delay_ms(SIGNAL_RSSI_DELAY_MS);

        let mut byte = [0u8; 1];
        self.read_exact_bounded(&mut byte, RESPONSE_TIMEOUT_MS)?;
        Ok(rssi_dbm(byte[0]))
    }

    fn read_model(&mut self) -> Result<(), Error> {
        let response = self.at_exchange(AtCommand::ModelNumber)?;
        if !response.starts_with(MODEL_FAMILY) {
            return Err(Error::IdentityMismatch);
        }
        self.model = response;
        Ok(())
    }

    fn read_firmware_version(&mut self) -> Result<(), Error> {
        self.version = self.at_exchange(AtCommand::FirmwareVersion)?;
        Ok(())
    }

    fn read_all_registers(&mut self) -> Result<(), Error> {
        let mut bytes = [0u8; RegisterFile::LEN];
        for (index, slot) in bytes.iter_mut().enumerate() {
            let response = self.transfer(&commands::read_request(index as u8))?;
            if !response.is_ok() {
                return Err(Error::UnexpectedResponse);
            }
            *slot = response.payload;
        }
        self.registers = RegisterFile::from(bytes);
        Ok(())
    }

    fn write_all_registers(&mut self, mode: SaveMode) -> Result<(), Error> {
        let frame = commands::write_request(mode, self.registers.writable_bytes());
        let response = self.transfer(&frame)?;
        if !response.is_ok() {
            return Err(Error::UnexpectedResponse);
        }
        Ok(())
    }

    /// Writes a binary request and reads the fixed 4-byte response.
    fn transfer(&mut self, request: &[u8]) -> Result<ResponseFrame, Error> {
        self.serial.write_all(request).map_err(|_| Error::Bus)?;
        self.serial.flush().map_err(|_| Error::Bus)?;

        let mut raw = [0u8; commands::RESPONSE_LEN];
        self.read_exact_bounded(&mut raw, RESPONSE_TIMEOUT_MS)?;
        Ok(ResponseFrame::from_bytes(raw))
    }

    /// Runs one AT exchange in PROGRAM mode and returns the stripped
    /// response text. The mode is unconditionally restored to NORMAL.
    fn at_exchange(&mut self, command: AtCommand) -> Result<String<MAX_RESPONSE_LEN>, Error> {
        self.set_mode(OperatingMode::Program)?;
        let result = self.at_request(command);
        let restore = self.set_mode(OperatingMode::Normal);

        let response = result?;
        restore?;
        Ok(response)
    }

    fn at_request(&mut self, command: AtCommand) -> Result<String<MAX_RESPONSE_LEN>, Error> {
        self.serial
            .write_all(command.text().as_bytes())
            .map_err(|_| Error::Bus)?;
        self.serial
            .write_all(AT_TERMINATOR.as_bytes())
            .map_err(|_| Error::Bus)?;
        self.serial.flush().map_err(|_| Error::Bus)?;

        let raw = self.read_at_response()?;
        if raw.is_empty() {
            return Err(Error::ModuleUnresponsive);
        }

        let text = core::str::from_utf8(&raw).map_err(|_| Error::UnexpectedResponse)?;
        let stripped = command.strip_response(text.trim_end());

        let mut response = String::new();
        response
            .push_str(stripped)
            .map_err(|_| Error::UnexpectedResponse)?;
        Ok(response)
    }

    /// Accumulates AT response bytes until a newline, the capacity ceiling
    /// or the overall deadline. There is no separate inter-byte timeout.
    fn read_at_response(&mut self) -> Result<Vec<u8, MAX_RESPONSE_LEN>, Error> {
        let mut raw = Vec::new();
        let mut waited_ms = 0;

        loop {
            match self.serial.read_ready() {
                Ok(true) => {
                    let mut byte = [0u8; 1];
                    let n = self.serial.read(&mut byte).map_err(|_| Error::Bus)?;
                    if n == 0 || byte[0] == b'\n' {
                        break;
                    }
                    if raw.push(byte[0]).is_err() {
                        break;
                    }
                }
                Ok(false) => {
                    if waited_ms >= AT_RESPONSE_TIMEOUT_MS {
                        break;
                    }
                    self.delay.delay_ms(RESPONSE_POLL_INTERVAL_MS);
                    waited_ms += RESPONSE_POLL_INTERVAL_MS;
                }
                Err(_) => return Err(Error::Bus),
            }
        }

        Ok(raw)
    }

    /// Fills `buf` from the transport, polling at a fixed interval and
    /// giving up once the accumulated wait exceeds `timeout_ms`.
    ///
    /// The timeout only bounds the wait; bytes already in flight may still
    /// arrive after it elapses.
    fn read_exact_bounded(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<(), Error> {
        let mut filled = 0;
        let mut waited_ms = 0;

        while filled < buf.len() {
            match self.serial.read_ready() {
                Ok(true) => {
                    let n = self
                        .serial
                        .read(&mut buf[filled..])
                        .map_err(|_| Error::Bus)?;
                    if n == 0 {
                        // Ready with nothing to read: the port is gone.
                        return Err(Error::Bus);
                    }
                    filled += n;
                }
                Ok(false) => {
                    if waited_ms >= timeout_ms {
                        return Err(Error::ModuleUnresponsive);
                    }
                    self.delay.delay_ms(RESPONSE_POLL_INTERVAL_MS);
                    waited_ms += RESPONSE_POLL_INTERVAL_MS;
                }
                Err(_) => return Err(Error::Bus),
            }
        }

        Ok(())
    }

    /// Drains stale bytes from the transport, bounded so a chattering
    /// module cannot wedge the driver.
    fn flush_transport(&mut self) {
        let mut scratch = [0u8; 1];
        for _ in 0..FLUSH_LIMIT {
            match self.serial.read_ready() {
                Ok(true) => {
                    if self.serial.read(&mut scratch).is_err() {
                        break;
                    }
                }
                _ => break,
            }
        }
    }

    /// Waits for the AUX line to report ready, polling at a fixed interval
    /// for at most `timeout_ms`. Without an AUX pin a single conservative
    /// delay is substituted.
    ///
    /// Best-effort: a timeout is not an error here. The protocol operations
    /// validate success from response bytes on their own.
    fn await_ready(&mut self, timeout_ms: u32) {
        let Some(aux) = self.aux.as_mut() else {
            self.delay.delay_ms(NO_AUX_SETTLE_MS);
            return;
        };

        for _ in 0..timeout_ms / READY_POLL_INTERVAL_MS {
            if matches!(aux.is_high(), Ok(true)) {
                return;
            }
            self.delay.delay_ms(READY_POLL_INTERVAL_MS);
        }
    }
}

/// Converts the module's raw RSSI byte to dBm.
fn rssi_dbm(raw: u8) -> i16 {
    -(256 - i16::from(raw))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinLevel, Transaction as PinTransaction,
    };

    use super::*;

    /// Scripted UART double: each entry pairs an expected request with the
    /// reply that becomes readable once the request has been written.
    struct MockSerial {
        rx: VecDeque<u8>,
        tx: std::vec::Vec<u8>,
        script: VecDeque<(std::vec::Vec<u8>, std::vec::Vec<u8>)>,
    }

    impl MockSerial {
        fn new(script: &[(&[u8], &[u8])]) -> Self {
            Self {
                rx: VecDeque::new(),
                tx: std::vec::Vec::new(),
                script: script
                    .iter()
                    .map(|(req, rep)| (req.to_vec(), rep.to_vec()))
                    .collect(),
            }
        }

        fn seed_rx(&mut self, bytes: &[u8]) {
            self.rx.extend(bytes);
        }

        fn try_advance(&mut self) {
            while let Some((expected, _)) = self.script.front() {
                if self.tx.len() < expected.len() || self.tx[..expected.len()] != expected[..] {
                    break;
                }
                let (expected, reply) = self.script.pop_front().unwrap();
                self.tx.drain(..expected.len());
                self.rx.extend(reply);
            }
        }

        fn done(&self) {
            assert!(
                self.script.is_empty(),
                "unconsumed script entries: {}",
                self.script.len()
            );
            assert!(self.tx.is_empty(), "unmatched request bytes: {:?}", self.tx);
        }
    }

    impl embedded_io::ErrorType for MockSerial {
        type Error = core::convert::Infallible;
    }

    impl Read for MockSerial {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            let mut n = 0;
            while n < buf.len() {
                match self.rx.pop_front() {
                    Some(byte) => {
                        buf[n] = byte;
                        n += 1;
                    }
                    None => break,
                }
            }
            Ok(n)
        }
    }

    impl ReadReady for MockSerial {
        fn read_ready(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.rx.is_empty())
        }
    }

    impl Write for MockSerial {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            self.tx.extend_from_slice(buf);
            self.try_advance();
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    /// Transport double for a closed/detached port: always reports readable
    /// but every read yields zero bytes.
    struct ClosedSerial;

    impl embedded_io::ErrorType for ClosedSerial {
        type Error = core::convert::Infallible;
    }

    impl Read for ClosedSerial {
        fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> {
            Ok(0)
        }
    }

    impl ReadReady for ClosedSerial {
        fn read_ready(&mut self) -> Result<bool, Self::Error> {
            Ok(true)
        }
    }

    impl Write for ClosedSerial {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    type TestDriver = E220<MockSerial, PinMock, PinMock, PinMock, NoopDelay>;

    fn driver(serial: MockSerial, m0: PinMock, m1: PinMock, aux: Option<PinMock>) -> TestDriver {
        E220::new(serial, m0, m1, aux, NoopDelay)
    }

    /// One `set_mode` call asserts each mode pin exactly once.
    fn pin_for_modes(levels: &[PinLevel]) -> PinMock {
        let transactions: std::vec::Vec<_> =
            levels.iter().map(|&level| PinTransaction::set(level)).collect();
        PinMock::new(&transactions)
    }

    fn finish(radio: TestDriver) {
        let (serial, mut m0, mut m1, aux, _) = radio.release();
        serial.done();
        m0.done();
        m1.done();
        if let Some(mut aux) = aux {
            aux.done();
        }
    }

    const READ_SCRIPT: [(&[u8], &[u8]); 9] = [
        (&[0xC1, 0x00, 0x01], &[0xC1, 0x00, 0x01, 0x12]), // ADDH
        (&[0xC1, 0x01, 0x01], &[0xC1, 0x00, 0x01, 0x34]), // ADDL
        (&[0xC1, 0x02, 0x01], &[0xC1, 0x00, 0x01, 0x62]), // REG0
        (&[0xC1, 0x03, 0x01], &[0xC1, 0x00, 0x01, 0x00]), // REG1
        (&[0xC1, 0x04, 0x01], &[0xC1, 0x00, 0x01, 0x9F]), // REG2 (channel)
        (&[0xC1, 0x05, 0x01], &[0xC1, 0x00, 0x01, 0x40]), // REG3
        (&[0xC1, 0x06, 0x01], &[0xC1, 0x00, 0x01, 0x00]), // CRYPT_H, reads as 0
        (&[0xC1, 0x07, 0x01], &[0xC1, 0x00, 0x01, 0x00]), // CRYPT_L, reads as 0
        (&[0xC1, 0x08, 0x01], &[0xC1, 0x00, 0x01, 0x07]), // PRODINFO
    ];

    #[test]
    fn init_reads_identity_and_parameters() {
        let mut script = std::vec![
            (
                b"AT+DEVTYPE=?\r\n".as_slice(),
                b"DEVTYPE=E220-900T22D\n".as_slice()
            ),
            (b"AT+FWCODE=?\r\n".as_slice(), b"FWCODE=7432\n".as_slice()),
        ];
        script.extend_from_slice(&READ_SCRIPT);

        // init: Normal, then Program/Normal around each of the two AT
        // queries and the register read.
        use PinLevel::{High, Low};
        let levels = [Low, High, Low, High, Low, High, Low];
        let m0 = pin_for_modes(&levels);
        let m1 = pin_for_modes(&levels);

        let mut radio = driver(MockSerial::new(&script), m0, m1, None);
        radio.init().unwrap();

        assert_eq!(radio.model(), "E220-900T22D");
        assert_eq!(radio.firmware_version(), "7432");
        assert_eq!(radio.address(), 0x1234);
        assert_eq!(radio.channel(), 0x9F);
        assert_eq!(radio.product_info(), 0x07);
        assert_eq!(radio.serial_config().uart_rate, UartBaudRate::Bps9600);
        assert_eq!(radio.operation_config().method, TransmitMethod::Fixed);
        assert_eq!(radio.mode(), OperatingMode::Normal);

        finish(radio);
    }

    #[test]
    fn init_fails_on_identity_mismatch() {
        let script = [(
            b"AT+DEVTYPE=?\r\n".as_slice(),
            b"DEVTYPE=E32-433T20D\n".as_slice(),
        )];

        use PinLevel::{High, Low};
        // Normal, then Program/Normal around the model query; init stops
        // after the failed identity check.
        let levels = [Low, High, Low];
        let m0 = pin_for_modes(&levels);
        let m1 = pin_for_modes(&levels);

        let mut radio = driver(MockSerial::new(&script), m0, m1, None);
        assert_eq!(radio.init(), Err(Error::IdentityMismatch));
        assert_eq!(radio.mode(), OperatingMode::Normal);
        assert_eq!(radio.model(), "");

        finish(radio);
    }

    #[test]
    fn save_writes_all_registers_in_wire_order() {
        use PinLevel::{High, Low};

        let mut radio = driver(
            MockSerial::new(&[]),
            pin_for_modes(&[High, Low]),
            pin_for_modes(&[High, Low]),
            None,
        );
        radio.set_address(0x1234);
        radio.set_channel(0x17);
        radio.set_packet_size(PacketSize::Bytes64);
        radio.set_transmit_power(TransmitPower::Dbm10);
        radio.set_encryption_key(0xABCD);

        let expected =
            commands::write_request(SaveMode::Temporary, radio.registers().writable_bytes());
        radio
            .serial
            .script
            .push_back((expected.to_vec(), std::vec![0xC1, 0x00, 0x08, 0x00]));

        radio.save(SaveMode::Temporary).unwrap();
        assert_eq!(radio.mode(), OperatingMode::Normal);

        finish(radio);
    }

    #[test]
    fn failed_save_still_restores_normal_mode() {
        use PinLevel::{High, Low};

        let mut radio = driver(
            MockSerial::new(&[]),
            pin_for_modes(&[High, Low]),
            pin_for_modes(&[High, Low]),
            None,
        );
        let expected =
            commands::write_request(SaveMode::Permanent, radio.registers().writable_bytes());
        radio
            .serial
            .script
            .push_back((expected.to_vec(), std::vec![0xFF, 0x00, 0x08, 0x00]));

        assert_eq!(
            radio.save(SaveMode::Permanent),
            Err(Error::UnexpectedResponse)
        );
        assert_eq!(radio.mode(), OperatingMode::Normal);

        finish(radio);
    }

    #[test]
    fn unanswered_read_reports_unresponsive_and_restores_mode() {
        use PinLevel::{High, Low};

        // Only the first register read gets a reply.
        let script = [(b"\xC1\x00\x01".as_slice(), b"\xC1\x00\x01\x12".as_slice())];
        let mut radio = driver(
            MockSerial::new(&script),
            pin_for_modes(&[High, Low]),
            pin_for_modes(&[High, Low]),
            None,
        );

        assert_eq!(radio.read_parameters(), Err(Error::ModuleUnresponsive));
        assert_eq!(radio.mode(), OperatingMode::Normal);

        // The unanswered second request never matched a script entry, so
        // only the pin expectations can be checked to the end here.
        let (serial, mut m0, mut m1, _, _) = radio.release();
        assert!(serial.script.is_empty());
        m0.done();
        m1.done();
    }

    #[test]
    fn ready_line_never_asserting_terminates_and_operation_fails() {
        use PinLevel::{High, Low};

        // Two mode changes, each polling AUX for the full bounded window.
        let polls = (MODE_SWITCH_TIMEOUT_MS / READY_POLL_INTERVAL_MS) as usize;
        let aux = PinMock::new(&std::vec![PinTransaction::get(PinLevel::Low); polls * 2]);

        let mut radio = driver(
            MockSerial::new(&[]),
            pin_for_modes(&[High, Low]),
            pin_for_modes(&[High, Low]),
            Some(aux),
        );
        let expected =
            commands::write_request(SaveMode::Permanent, radio.registers().writable_bytes());
        radio
            .serial
            .script
            .push_back((expected.to_vec(), std::vec::Vec::new()));

        assert_eq!(
            radio.save(SaveMode::Permanent),
            Err(Error::ModuleUnresponsive)
        );
        assert_eq!(radio.mode(), OperatingMode::Normal);

        finish(radio);
    }

    #[test]
    fn detached_transport_fails_instead_of_spinning() {
        use PinLevel::{High, Low};

        let mut radio: E220<ClosedSerial, _, _, PinMock, _> = E220::new(
            ClosedSerial,
            pin_for_modes(&[High, Low]),
            pin_for_modes(&[High, Low]),
            None,
            NoopDelay,
        );

        // A port that claims readiness but delivers no bytes must surface a
        // transport error, not poll until the timeout or hang.
        assert_eq!(radio.save(SaveMode::Permanent), Err(Error::Bus));
        assert_eq!(radio.mode(), OperatingMode::Normal);

        let (_, mut m0, mut m1, _, _) = radio.release();
        m0.done();
        m1.done();
    }

    #[test]
    fn mode_change_flushes_stale_bytes() {
        use PinLevel::High;

        let mut serial = MockSerial::new(&[]);
        serial.seed_rx(&[0xDE, 0xAD, 0xBE, 0xEF]);

        let mut radio = driver(serial, pin_for_modes(&[High]), pin_for_modes(&[High]), None);
        radio.set_mode(OperatingMode::Program).unwrap();

        assert!(radio.serial.rx.is_empty());
        assert_eq!(radio.mode(), OperatingMode::Program);
        finish(radio);
    }

    #[test]
    fn reset_acknowledged_by_ok() {
        use PinLevel::{High, Low};

        let script = [(b"AT+RESET\r\n".as_slice(), b"=OK\n".as_slice())];
        let mut radio = driver(
            MockSerial::new(&script),
            pin_for_modes(&[High, Low]),
            pin_for_modes(&[High, Low]),
            None,
        );

        radio.reset().unwrap();
        assert_eq!(radio.mode(), OperatingMode::Normal);
        finish(radio);
    }

    #[test]
    fn restore_defaults_rereads_parameters() {
        use PinLevel::{High, Low};

        let mut script = std::vec![(b"AT+DEFAULT\r\n".as_slice(), b"=OK\n".as_slice())];
        script.extend_from_slice(&READ_SCRIPT);

        // Program/Normal for the AT exchange, Program/Normal for the re-read.
        let levels = [High, Low, High, Low];
        let mut radio = driver(
            MockSerial::new(&script),
            pin_for_modes(&levels),
            pin_for_modes(&levels),
            None,
        );

        radio.restore_defaults().unwrap();
        assert_eq!(radio.channel(), 0x9F);
        finish(radio);
    }

    #[test]
    fn ambient_rssi_converts_to_dbm() {
        let mut radio = driver(
            MockSerial::new(&[(
                AMBIENT_RSSI_REQUEST.as_slice(),
                &[0xC1, 0x00, 0x02, 0x64],
            )]),
            pin_for_modes(&[]),
            pin_for_modes(&[]),
            None,
        );
        radio.set_ambient_rssi(true);

        assert_eq!(radio.read_ambient_rssi(), Ok(-156));
        finish(radio);
    }

    #[test]
    fn ambient_rssi_refused_when_flag_off() {
        let mut radio = driver(
            MockSerial::new(&[]),
            pin_for_modes(&[]),
            pin_for_modes(&[]),
            None,
        );

        assert_eq!(radio.read_ambient_rssi(), Err(Error::RssiDisabled));
        finish(radio);
    }

    #[test]
    fn signal_rssi_reads_trailing_byte() {
        let mut serial = MockSerial::new(&[]);
        serial.seed_rx(&[0x50]);

        let mut radio = driver(serial, pin_for_modes(&[]), pin_for_modes(&[]), None);
        radio.set_signal_rssi(true);

        assert_eq!(radio.read_signal_rssi(), Ok(-176));
        finish(radio);
    }

    #[test]
    fn transmit_frequency_derives_from_base_and_channel() {
        let mut radio = driver(
            MockSerial::new(&[]),
            pin_for_modes(&[]),
            pin_for_modes(&[]),
            None,
        );
        radio.set_channel(0x0A);

        assert_eq!(radio.transmit_frequency_mhz(), 860.125);
        finish(radio);
    }

    #[test]
    fn setters_only_touch_memory() {
        let mut radio = driver(
            MockSerial::new(&[]),
            pin_for_modes(&[]),
            pin_for_modes(&[]),
            None,
        );

        radio.set_address(0xBEEF);
        radio.set_uart_rate(UartBaudRate::Bps115200);
        radio.set_parity(Parity::Even);
        radio.set_air_rate(AirDataRate::Bps62500);
        radio.set_packet_size(PacketSize::Bytes32);
        radio.set_ambient_rssi(true);
        radio.set_software_mode_switch(true);
        radio.set_transmit_power(TransmitPower::Dbm13);
        radio.set_channel(0x17);
        radio.set_signal_rssi(true);
        radio.set_transmit_method(TransmitMethod::Fixed);
        radio.set_lbt(true);
        radio.set_wor_cycle(WorCycle::Ms2000);
        radio.set_encryption_key(0x0102);

        assert_eq!(radio.address(), 0xBEEF);
        assert_eq!(radio.serial_config().uart_rate, UartBaudRate::Bps115200);
        assert_eq!(radio.serial_config().parity, Parity::Even);
        assert_eq!(radio.serial_config().air_rate, AirDataRate::Bps62500);
        assert_eq!(radio.transmission_config().packet_size, PacketSize::Bytes32);
        assert!(radio.transmission_config().ambient_rssi);
        assert!(radio.transmission_config().software_mode_switch);
        assert_eq!(radio.transmission_config().power, TransmitPower::Dbm13);
        assert_eq!(radio.channel(), 0x17);
        assert!(radio.operation_config().signal_rssi);
        assert_eq!(radio.operation_config().method, TransmitMethod::Fixed);
        assert!(radio.operation_config().lbt);
        assert_eq!(radio.operation_config().wor_cycle, WorCycle::Ms2000);
        assert_eq!(radio.registers().writable_bytes()[6..], [0x01, 0x02]);

        // no script entries, no pin transactions: nothing reached hardware
        finish(radio);
    }
}
