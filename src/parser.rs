//! Incoming command line parsing.
//!
//! [`CommandParser`] accumulates bytes from a serial-like transport into a
//! fixed-size line buffer and, on each line terminator, validates the
//! optional `|<checksum>` suffix, splits off the optional `<id>:` device
//! prefix, tokenizes the command and its arguments, and hands the result to
//! a [`CommandHandler`].
//!
//! # Line format
//!
//! ```text
//! [deviceId:] command [ arg1 [ arg2 ... ] ] [|checksum]
//! ```
//!
//! - the device id is 1-4 characters followed by `:`;
//! - arguments are space-separated; an argument containing spaces is wrapped
//!   in `"` (there is no escape for `"` or `|` inside quotes);
//! - the checksum is the decimal value of the line bytes before `|`.
//!
//! Malformed input never fails the feed loop: a bad line is dropped and the
//! parser keeps consuming. The most recent drop is observable through
//! [`CommandParser::last_drop`] for hosts that want diagnostics.

use heapless::Vec;

use crate::checksum::{checksum, ChecksumMode};
use crate::fmt;

/// Longest storable line body in bytes. Longer lines are discarded whole.
pub const MAX_LINE_LENGTH: usize = 100;

/// Maximum number of arguments per command; extra text is ignored.
pub const MAX_COMMAND_ARGS: usize = 10;

/// Longest device id prefix, in characters before the `:`.
pub const MAX_DEVICE_ID_LENGTH: usize = 4;

/// One parsed command line.
///
/// All fields borrow from the parser's line buffer and are only valid for
/// the duration of the handler call; the buffer is reused for the next line
/// as soon as the handler returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand<'line> {
    /// Device id prefix, or the parser's default if the line had none.
    pub device_id: Option<&'line str>,
    /// Command word. Never empty.
    pub command: &'line str,
    /// Arguments in line order, quotes stripped.
    pub args: Vec<&'line str, MAX_COMMAND_ARGS>,
}

impl<'line> ParsedCommand<'line> {
    /// Argument by position, if present.
    #[inline]
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&'line str> {
        self.args.get(index).copied()
    }
}

/// Receiver for parsed command lines.
///
/// Called synchronously from [`CommandParser::feed`], once per accepted
/// line. Implementations must not retain the borrowed views in the
/// [`ParsedCommand`] beyond the call; copy anything that needs to live
/// longer.
pub trait CommandHandler {
    /// Handle one parsed command line.
    fn handle(&mut self, command: &ParsedCommand<'_>);
}

/// Why a received line was discarded without reaching the handler.
///
/// Every variant is non-fatal; the parser keeps consuming input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DropReason {
    /// The `|<number>` suffix did not match the recomputed checksum, or was
    /// not a decimal u16 at all.
    ChecksumMismatch,
    /// The line had no checksum suffix while one was required.
    ChecksumMissing,
    /// The line outgrew the buffer and was reset to empty.
    LineOverflow,
    /// Nothing was left for the command word (e.g. a checksum-only line).
    EmptyCommand,
    /// The line body was not valid UTF-8. Unreachable through [`CommandParser::feed`],
    /// which only admits 7-bit ASCII, but possible via [`parse_line`].
    Malformed,
}

/// Validate and split one complete line (terminator already stripped).
///
/// This is the stateless core of [`CommandParser`]: checksum verification,
/// device id detection, and tokenization. The returned views borrow from
/// `line`.
///
/// Note: the checksum suffix is located by searching for the *last* `|` in
/// the line. Quoted arguments have no escape for `|`, so a literal `|` in
/// the final argument of an unchecksummed line is indistinguishable from a
/// suffix — a known ambiguity of the wire format, not something this parser
/// resolves.
pub fn parse_line(
    line: &[u8],
    mode: ChecksumMode,
    require_checksum: bool,
) -> Result<ParsedCommand<'_>, DropReason> {
    let body = match line.iter().rposition(|&b| b == b'|') {
        Some(pipe) => {
            let given =
                fmt::parse_u16(&line[pipe + 1..]).ok_or(DropReason::ChecksumMismatch)?;
            let body = &line[..pipe];
            if checksum(mode, body) != given {
                return Err(DropReason::ChecksumMismatch);
            }
            body
        }
        None if require_checksum => return Err(DropReason::ChecksumMissing),
        None => line,
    };

    let text = core::str::from_utf8(body).map_err(|_| DropReason::Malformed)?;
    let text = text.trim_start_matches(' ');

    // Device id prefix: a colon within the first five characters, but not
    // in first position.
    let colon = text
        .bytes()
        .take(MAX_DEVICE_ID_LENGTH + 1)
        .position(|b| b == b':');
    let (device_id, rest) = match colon {
        Some(pos) if pos >= 1 => (
            Some(&text[..pos]),
            text[pos + 1..].trim_start_matches(' '),
        ),
        _ => (None, text),
    };

    let (command, arg_text) = match rest.find(' ') {
        Some(space) => (&rest[..space], &rest[space + 1..]),
        None => (rest, ""),
    };

    if command.is_empty() {
        return Err(DropReason::EmptyCommand);
    }

    let mut args = Vec::new();
    tokenize(arg_text, &mut args);

    Ok(ParsedCommand {
        device_id,
        command,
        args,
    })
}

/// Split argument text into up to [`MAX_COMMAND_ARGS`] tokens.
///
/// A token either runs to the next space, or — when it opens with `"` — to
/// the next `"` (or end of text if the quote is unterminated). Trailing
/// spaces before the closing quote are stripped from the value. Quoted
/// tokens may be empty; trailing whitespace never produces an empty token.
fn tokenize<'line>(text: &'line str, args: &mut Vec<&'line str, MAX_COMMAND_ARGS>) {
    let bytes = text.as_bytes();
    let mut pos = 0;

    while args.len() < MAX_COMMAND_ARGS {
        while pos < bytes.len() && bytes[pos] == b' ' {
            pos += 1;
        }
        if pos == bytes.len() {
            break;
        }

        let arg = if bytes[pos] == b'"' {
            pos += 1;
            let start = pos;
            while pos < bytes.len() && bytes[pos] != b'"' {
                pos += 1;
            }
            let arg = text[start..pos].trim_end_matches(' ');
            if pos < bytes.len() {
                pos += 1; // closing quote
            }
            arg
        } else {
            let start = pos;
            while pos < bytes.len() && bytes[pos] != b' ' {
                pos += 1;
            }
            &text[start..pos]
        };

        if args.push(arg).is_err() {
            break;
        }
    }
}

/// Byte-at-a-time command line parser.
///
/// Feed it raw transport bytes from a polling loop; it invokes the handler
/// once per complete, valid line. All state lives in a fixed-size buffer —
/// no allocation after construction. Not safe for concurrent use; confine it
/// to a single call site.
///
/// # Example
///
/// ```
/// use command_proto::{ChecksumMode, CommandHandler, CommandParser, ParsedCommand};
///
/// struct Led {
///     on: bool,
/// }
///
/// impl CommandHandler for Led {
///     fn handle(&mut self, cmd: &ParsedCommand<'_>) {
///         if cmd.command == "led" {
///             self.on = cmd.arg(0) == Some("on");
///         }
///     }
/// }
///
/// let mut parser = CommandParser::new(Led { on: false }, ChecksumMode::Crc16);
/// parser.feed_slice(b"led on\n");
/// assert!(parser.handler().on);
/// ```
pub struct CommandParser<'id, H> {
    handler: H,
    default_device_id: Option<&'id str>,
    mode: ChecksumMode,
    require_checksum: bool,
    buffer: Vec<u8, MAX_LINE_LENGTH>,
    last_drop: Option<DropReason>,
}

impl<'id, H: CommandHandler> CommandParser<'id, H> {
    /// Create a parser that dispatches to `handler`.
    ///
    /// The mode must match the sender's [`ChecksumStream`](crate::ChecksumStream),
    /// or every checksummed line will be rejected.
    #[must_use]
    pub fn new(handler: H, mode: ChecksumMode) -> Self {
        Self {
            handler,
            default_device_id: None,
            mode,
            require_checksum: false,
            buffer: Vec::new(),
            last_drop: None,
        }
    }

    /// Use `device_id` for lines that carry no `<id>:` prefix.
    ///
    /// The string is borrowed from the caller for the life of the parser.
    #[must_use]
    pub fn with_default_device_id(mut self, device_id: &'id str) -> Self {
        self.default_device_id = Some(device_id);
        self
    }

    /// Toggle whether lines without a checksum suffix are dropped.
    ///
    /// Off by default: the checksum is optional on incoming lines.
    pub fn require_checksum(&mut self, required: bool) {
        self.require_checksum = required;
    }

    /// The checksum mode this parser validates with.
    #[inline]
    #[must_use]
    pub fn mode(&self) -> ChecksumMode {
        self.mode
    }

    /// Borrow the handler.
    #[inline]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Mutably borrow the handler.
    #[inline]
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Unwrap, returning the handler.
    #[must_use]
    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Outcome of the most recently terminated line: `None` if it reached
    /// the handler, or why it was dropped. Overflow is recorded as soon as
    /// it happens.
    #[inline]
    #[must_use]
    pub fn last_drop(&self) -> Option<DropReason> {
        self.last_drop
    }

    /// Feed one byte from the transport.
    ///
    /// Never blocks and never fails; malformed lines are silently dropped.
    pub fn feed(&mut self, byte: u8) {
        // NUL, non-ASCII noise, and signed sentinel values (an EOF marker
        // read back as a raw byte) never enter the buffer.
        if byte == 0 || byte > 0x7F {
            return;
        }

        if matches!(byte, b'\n' | b'\r') {
            // Empty buffer means a bare terminator (or the second half of a
            // CRLF pair): no callback.
            if !self.buffer.is_empty() {
                self.dispatch();
                self.buffer.clear();
            }
            return;
        }

        if self.buffer.push(byte).is_err() {
            // Overflow drops the whole line instead of truncating it into a
            // plausible-looking command. The byte itself is dropped too;
            // whatever follows accumulates as a fresh line.
            self.buffer.clear();
            self.last_drop = Some(DropReason::LineOverflow);
        }
    }

    /// Feed a run of bytes, one at a time.
    pub fn feed_slice(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.feed(byte);
        }
    }

    fn dispatch(&mut self) {
        match parse_line(&self.buffer, self.mode, self.require_checksum) {
            Ok(mut cmd) => {
                if cmd.device_id.is_none() {
                    cmd.device_id = self.default_device_id;
                }
                self.last_drop = None;
                self.handler.handle(&cmd);
            }
            Err(reason) => {
                self.last_drop = Some(reason);
            }
        }
    }
}
