//! Line-oriented reading of request bytes.

use tokio::io::{AsyncBufReadExt, AsyncReadExt};

/// How a call to [`read_line`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnd {
    /// A `\n`, `\r\n` or lone `\r` terminator was consumed.
    Terminator,
    /// The connection was closed or a read failed.
    Closed,
    /// `max_len - 1` bytes were read without seeing a terminator.
    Truncated,
}

/// A single line read off a connection, terminator excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// The line bytes, without the terminator.
    pub bytes: Vec<u8>,
    /// Why reading stopped.
    pub end: LineEnd,
}

impl Line {
    /// Number of bytes in the line.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true for a zero-length line.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns true if the connection stopped producing data.
    pub fn is_closed(&self) -> bool {
        self.end == LineEnd::Closed
    }
}

/// Read a single line from `reader`.
///
/// Bytes are taken one at a time until a terminator is seen or `max_len - 1`
/// bytes have been collected. A `\r` peeks at the next buffered byte without
/// consuming it: a following `\n` is swallowed with it, anything else is left
/// in place and the lone `\r` ends the line. A failed or empty read also ends
/// the line, returning whatever was accumulated so far.
pub async fn read_line<R>(reader: &mut R, max_len: usize) -> Line
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let mut bytes = Vec::new();

    while bytes.len() + 1 < max_len {
        let byte = match reader.read_u8().await {
            Ok(byte) => byte,
            Err(_) => {
                return Line {
                    bytes,
                    end: LineEnd::Closed,
                }
            }
        };

        match byte {
            b'\n' => {
                return Line {
                    bytes,
                    end: LineEnd::Terminator,
                }
            }
            b'\r' => {
                let followed_by_lf = matches!(reader.fill_buf().await, Ok([b'\n', ..]));
                if followed_by_lf {
                    reader.consume(1);
                }
                return Line {
                    bytes,
                    end: LineEnd::Terminator,
                };
            }
            other => bytes.push(other),
        }
    }

    Line {
        bytes,
        end: LineEnd::Truncated,
    }
}

/// C `isspace` in the "C" locale: space, tab, LF, VT, FF and CR.
pub(crate) fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}
