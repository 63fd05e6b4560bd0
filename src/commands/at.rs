//! Textual AT command fallback
//!
//! Four operations have no binary-protocol equivalent and fall back to ASCII
//! AT commands: model identity, firmware identity, soft reset and
//! factory-default restore. A command line is terminated with `\r\n`; the
//! response ends at a newline or is truncated at a fixed byte ceiling, and a
//! known literal prefix is stripped from the front when present.

/// Line terminator appended to every AT command.
pub const AT_TERMINATOR: &str = "\r\n";

/// Ceiling on accumulated AT response bytes. Responses longer than this are
/// truncated, matching the module's short fixed-format answers.
pub const MAX_RESPONSE_LEN: usize = 32;

/// Acknowledgement expected from reset and restore commands after prefix
/// stripping.
pub const AT_OK: &str = "OK";

/// The AT operations the driver issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AtCommand {
    /// Queries the module model string (`DEVTYPE`).
    ModelNumber,
    /// Queries the firmware code string (`FWCODE`).
    FirmwareVersion,
    /// Soft-reboots the module.
    Reset,
    /// Restores factory default parameters.
    RestoreDefaults,
}

impl AtCommand {
    /// The command line, without the terminator.
    pub fn text(self) -> &'static str {
        match self {
            AtCommand::ModelNumber => "AT+DEVTYPE=?",
            AtCommand::FirmwareVersion => "AT+FWCODE=?",
            AtCommand::Reset => "AT+RESET",
            AtCommand::RestoreDefaults => "AT+DEFAULT",
        }
    }

    /// The literal prefix the module puts in front of this command's
    /// response.
    pub fn response_prefix(self) -> &'static str {
        match self {
            AtCommand::ModelNumber => "DEVTYPE=",
            AtCommand::FirmwareVersion => "FWCODE=",
            AtCommand::Reset | AtCommand::RestoreDefaults => "=",
        }
    }

    /// Strips this command's response prefix when present. Responses without
    /// the prefix pass through unchanged.
    pub fn strip_response<'a>(self, response: &'a str) -> &'a str {
        response
            .strip_prefix(self.response_prefix())
            .unwrap_or(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_response_prefix_is_stripped() {
        assert_eq!(
            AtCommand::ModelNumber.strip_response("DEVTYPE=E220"),
            "E220"
        );
        assert_eq!(
            AtCommand::FirmwareVersion.strip_response("FWCODE=7432"),
            "7432"
        );
    }

    #[test]
    fn acknowledgement_prefix_is_stripped() {
        assert_eq!(AtCommand::Reset.strip_response("=OK"), "OK");
        assert_eq!(AtCommand::RestoreDefaults.strip_response("=OK"), "OK");
    }

    #[test]
    fn missing_prefix_passes_through() {
        assert_eq!(AtCommand::ModelNumber.strip_response("E220-900"), "E220-900");
        assert_eq!(AtCommand::Reset.strip_response("OK"), "OK");
    }

    #[test]
    fn command_lines_match_wire_format() {
        assert_eq!(AtCommand::ModelNumber.text(), "AT+DEVTYPE=?");
        assert_eq!(AtCommand::Reset.text(), "AT+RESET");
    }
}
