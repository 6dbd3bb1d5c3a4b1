//! Line-based device command protocol: parsing and checksum framing.
//!
//! This crate implements the two halves of a small serial command protocol
//! for embedded devices:
//!
//! - **Parsing**: [`CommandParser`] consumes transport bytes one at a time,
//!   buffers them into lines, validates an optional checksum suffix, splits
//!   off an optional device id prefix, tokenizes the command and arguments
//!   (with double-quoted arguments), and dispatches each accepted line to a
//!   [`CommandHandler`]. [`parse_line`] exposes the stateless line splitter.
//!
//! - **Framing**: [`ChecksumStream`] wraps an outgoing byte sink and splices
//!   the matching checksum suffix in front of every line terminator, so both
//!   directions stay behaviorally symmetric.
//!
//! # Protocol Format
//!
//! ```text
//! [deviceId:] command [ arg1 [ arg2 ... ] ] [|checksum]\n
//! ```
//!
//! - `deviceId` — 1-4 characters followed by `:`, addressing one unit in
//!   multi-device deployments. Lines without a prefix fall back to the
//!   parser's default id.
//! - Arguments are space-separated; an argument containing spaces is wrapped
//!   in `"`. There is no escape mechanism for `"` or `|` inside quotes.
//! - `checksum` — decimal value of all line bytes before the `|`, computed
//!   with CRC-16/MCRF4XX by default or an 8-bit additive sum in
//!   [`ChecksumMode::Legacy`]. Either `\n` or `\r` terminates a line; CRLF
//!   pairs count once.
//!
//! Malformed input — bad checksum, overlong line, empty command — is dropped
//! silently and the parser keeps consuming. Nothing in the inbound path can
//! fail the feed loop; that is what makes the protocol usable over a noisy
//! link.
//!
//! # Example
//!
//! ```
//! use command_proto::{ChecksumMode, CommandHandler, CommandParser, ParsedCommand};
//!
//! #[derive(Default)]
//! struct Pins {
//!     set: u32,
//! }
//!
//! impl CommandHandler for Pins {
//!     fn handle(&mut self, cmd: &ParsedCommand<'_>) {
//!         // Views into `cmd` are only valid for the duration of this call;
//!         // copy out anything that must outlive it.
//!         if cmd.command == "set" {
//!             self.set += 1;
//!         }
//!     }
//! }
//!
//! let mut parser =
//!     CommandParser::new(Pins::default(), ChecksumMode::Crc16).with_default_device_id("00");
//!
//! parser.feed_slice(b"set pin 13\r\n");
//! parser.feed_slice(b"A1:set pin 7 \"fast mode\"\r\n");
//! assert_eq!(parser.handler().set, 2);
//! ```
//!
//! # Features
//!
//! - **`std`**: host-side conveniences (`ByteStream` for `std::vec::Vec<u8>`)
//! - **`defmt`**: `defmt::Format` derives for embedded logging
//! - **`embedded-io`**: [`ChecksumWriter`] adapter for `embedded_io::Write`
//!   peripherals
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and performs no heap allocation:
//! all parser state lives in fixed-size buffers, which also removes every
//! allocation-failure path on memory-constrained targets.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod checksum;
mod fmt;
pub mod parser;
pub mod stream;

// Re-export the main types at crate root for convenience
pub use checksum::{checksum, ChecksumDigest, ChecksumMode};
pub use parser::{
    parse_line, CommandHandler, CommandParser, DropReason, ParsedCommand, MAX_COMMAND_ARGS,
    MAX_DEVICE_ID_LENGTH, MAX_LINE_LENGTH,
};
#[cfg(feature = "embedded-io")]
pub use stream::ChecksumWriter;
pub use stream::{ByteStream, ChecksumStream};
