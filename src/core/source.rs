//! Character sources for the statement splitter.
//!
//! A [`CharSource`] yields one character at a time. [`Lookahead`] wraps a
//! source with a small peek buffer so multi-character delimiters (`--`,
//! `*/`, `$tag$`) can be inspected without consuming them.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::io::{self, BufRead};

/// Maximum number of characters the splitter ever asks to peek.
pub const LOOKAHEAD_WINDOW: usize = 64;

/// A pull-based supplier of characters.
pub trait CharSource {
    /// Error raised when the underlying input cannot be read.
    type Error;

    /// Pull the next character, or `None` at end of input.
    fn next_char(&mut self) -> Result<Option<char>, Self::Error>;
}

impl CharSource for std::str::Chars<'_> {
    type Error = Infallible;

    fn next_char(&mut self) -> Result<Option<char>, Infallible> {
        Ok(self.next())
    }
}

/// Decodes UTF-8 characters from a buffered byte stream.
///
/// Malformed or truncated sequences are reported as
/// [`io::ErrorKind::InvalidData`].
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        loop {
            match self.reader.fill_buf() {
                Ok(buf) => {
                    let byte = buf.first().copied();
                    if byte.is_some() {
                        self.reader.consume(1);
                    }
                    return Ok(byte);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

/// Length of the UTF-8 sequence introduced by `lead`, or `None` if `lead`
/// cannot start a sequence.
fn sequence_len(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7F => Some(1),
        0xC2..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF4 => Some(4),
        _ => None,
    }
}

fn invalid_utf8(detail: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, detail.into())
}

impl<R: BufRead> CharSource for ReaderSource<R> {
    type Error = io::Error;

    fn next_char(&mut self) -> io::Result<Option<char>> {
        let Some(lead) = self.next_byte()? else {
            return Ok(None);
        };
        let len = sequence_len(lead)
            .ok_or_else(|| invalid_utf8(format!("invalid UTF-8 lead byte 0x{lead:02x}")))?;

        let mut bytes = [lead, 0, 0, 0];
        for slot in bytes.iter_mut().take(len).skip(1) {
            *slot = self
                .next_byte()?
                .ok_or_else(|| invalid_utf8("truncated UTF-8 sequence at end of input"))?;
        }

        let decoded = std::str::from_utf8(&bytes[..len]).map_err(|e| invalid_utf8(e.to_string()))?;
        Ok(decoded.chars().next())
    }
}

/// A character source with a bounded peek buffer.
#[derive(Debug)]
pub struct Lookahead<S> {
    source: S,
    buffer: VecDeque<char>,
    exhausted: bool,
}

impl<S: CharSource> Lookahead<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            buffer: VecDeque::with_capacity(LOOKAHEAD_WINDOW),
            exhausted: false,
        }
    }

    /// Pull from the source until `n` characters are buffered or input ends.
    fn fill(&mut self, n: usize) -> Result<(), S::Error> {
        while self.buffer.len() < n && !self.exhausted {
            match self.source.next_char()? {
                Some(c) => self.buffer.push_back(c),
                None => self.exhausted = true,
            }
        }
        Ok(())
    }

    /// Consume and return the next character.
    pub fn next(&mut self) -> Result<Option<char>, S::Error> {
        if let Some(c) = self.buffer.pop_front() {
            return Ok(Some(c));
        }
        if self.exhausted {
            return Ok(None);
        }
        match self.source.next_char()? {
            Some(c) => Ok(Some(c)),
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    /// Return up to `n` upcoming characters without consuming them.
    ///
    /// Fewer than `n` are returned only when the input ends first.
    pub fn peek(&mut self, n: usize) -> Result<&[char], S::Error> {
        debug_assert!(n <= LOOKAHEAD_WINDOW, "peek of {n} exceeds lookahead window");
        let n = n.min(LOOKAHEAD_WINDOW);
        self.fill(n)?;
        let available = n.min(self.buffer.len());
        Ok(&self.buffer.make_contiguous()[..available])
    }

    /// True if the next character is `expected`.
    pub fn next_is(&mut self, expected: char) -> Result<bool, S::Error> {
        Ok(self.peek(1)?.first() == Some(&expected))
    }

    /// Consume up to `n` characters, returning those actually consumed.
    pub fn bump(&mut self, n: usize) -> Result<Vec<char>, S::Error> {
        let mut taken = Vec::with_capacity(n);
        for _ in 0..n {
            match self.next()? {
                Some(c) => taken.push(c),
                None => break,
            }
        }
        Ok(taken)
    }
}
