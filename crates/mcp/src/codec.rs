// Line framing for the stdio transport

use bytes::BytesMut;
use tokio_util::codec::{Decoder, LinesCodec, LinesCodecError};

/// Longest accepted message line (1 MiB)
pub const MAX_LINE_LENGTH: usize = 1024 * 1024;

/// One newline-delimited frame read from the peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Line(String),
    /// A line that could not be taken as text; the reason is for logging
    Malformed(&'static str),
}

/// Newline-delimited decoder that reports bad lines as frames instead of
/// failing the stream.
///
/// `FramedRead` stops after the first decoder error, so invalid UTF-8 and
/// overlong lines are surfaced as [`Frame::Malformed`]. Only I/O errors end
/// the stream.
#[derive(Debug)]
pub struct JsonLineCodec {
    inner: LinesCodec,
}

impl JsonLineCodec {
    pub fn new() -> Self {
        Self::with_max_length(MAX_LINE_LENGTH)
    }

    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            inner: LinesCodec::new_with_max_length(max_length),
        }
    }

    fn classify(
        result: Result<Option<String>, LinesCodecError>,
    ) -> Result<Option<Frame>, LinesCodecError> {
        match result {
            Ok(line) => Ok(line.map(Frame::Line)),
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                Ok(Some(Frame::Malformed("line exceeds maximum length")))
            }
            Err(LinesCodecError::Io(e)) if e.kind() == std::io::ErrorKind::InvalidData => {
                Ok(Some(Frame::Malformed("line is not valid UTF-8")))
            }
            Err(e) => Err(e),
        }
    }
}

impl Default for JsonLineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for JsonLineCodec {
    type Item = Frame;
    type Error = LinesCodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, LinesCodecError> {
        Self::classify(self.inner.decode(buf))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, LinesCodecError> {
        Self::classify(self.inner.decode_eof(buf))
    }
}
