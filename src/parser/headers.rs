//! Header block handling.
//!
//! Headers are never parsed into a map. A request either has its header block
//! thrown away, or scanned for a single `Content-Length` line.

use log::debug;

use crate::parser::error::Error;
use crate::parser::line::{is_space, read_line};

const CONTENT_LENGTH_PREFIX: &[u8] = b"Content-Length:";

/// Offset of the value within a `Content-Length:` line, one past the space
/// that conventionally follows the colon.
const CONTENT_LENGTH_VALUE_OFFSET: usize = 16;

/// Read and discard header lines until a zero-length line or a closed
/// connection. Returns the number of non-empty lines discarded.
pub async fn drain_headers<R>(reader: &mut R, max_len: usize) -> usize
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let mut drained = 0;
    loop {
        let line = read_line(reader, max_len).await;
        if line.is_empty() {
            break;
        }
        drained += 1;
        if line.is_closed() {
            break;
        }
    }
    debug!("Drained {drained} header lines");
    drained
}

/// Consume the header block, returning the value of its `Content-Length`
/// header.
///
/// The header name match is case-sensitive and the value is read with C
/// `atoi` rules starting at byte 16 of the line. When the header appears more
/// than once the last occurrence wins.
pub async fn find_content_length<R>(reader: &mut R, max_len: usize) -> Result<i64, Error>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let mut content_length = None;
    loop {
        let line = read_line(reader, max_len).await;
        if line.is_empty() {
            break;
        }
        if line.bytes.starts_with(CONTENT_LENGTH_PREFIX) {
            let value = line.bytes.get(CONTENT_LENGTH_VALUE_OFFSET..).unwrap_or_default();
            content_length = Some(parse_leading_integer(value));
        }
        if line.is_closed() {
            break;
        }
    }
    content_length.ok_or(Error::MissingContentLength)
}

/// Parse a decimal integer the way C `atoi` does: skip leading whitespace,
/// accept one optional sign, then take digits until the first non-digit.
/// No digits yields 0; overflow saturates.
pub(crate) fn parse_leading_integer(bytes: &[u8]) -> i64 {
    let mut rest = bytes;
    while let [first, tail @ ..] = rest {
        if !is_space(*first) {
            break;
        }
        rest = tail;
    }

    let negative = match rest {
        [b'-', tail @ ..] => {
            rest = tail;
            true
        }
        [b'+', tail @ ..] => {
            rest = tail;
            false
        }
        _ => false,
    };

    let mut value: i64 = 0;
    for digit in rest.iter().take_while(|b| b.is_ascii_digit()) {
        let digit = i64::from(digit - b'0');
        value = if negative {
            value.saturating_mul(10).saturating_sub(digit)
        } else {
            value.saturating_mul(10).saturating_add(digit)
        };
    }
    value
}
