use crate::error::SjsonError;

/// A line/column position inside an SJSON document. Both are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Default for Location {
    fn default() -> Self {
        Location { line: 1, column: 1 }
    }
}

/// A byte cursor over SJSON text meant for reading.
///
/// The stream keeps track of the line and column of the next unread byte so
/// that every parse error can point at the offending character.
///
/// ```
/// let mut stream = nidl_schema::InputStream::new(b"a\nbc");
/// assert_eq!(stream.read(), Ok(b'a'));
/// assert_eq!(stream.read(), Ok(b'\n'));
/// assert_eq!(stream.location().line, 2);
/// assert_eq!(stream.peek(), Some(b'b'));
/// ```
pub struct InputStream<'a> {
    data: &'a [u8],
    index: usize,
    location: Location,
}

impl<'a> InputStream<'a> {
    /// Create a new stream that wraps the provided byte slice.
    pub fn new(data: &'a [u8]) -> InputStream<'a> {
        InputStream {
            data,
            index: 0,
            location: Location::default(),
        }
    }

    /// Retrieves the current index into the underlying byte slice.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The location of the next unread byte.
    pub fn location(&self) -> Location {
        self.location
    }

    /// Returns true once every byte has been consumed.
    pub fn is_at_end(&self) -> bool {
        self.index >= self.data.len()
    }

    /// Look at the next byte without consuming it.
    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.index).copied()
    }

    /// Look at the byte `offset` positions ahead without consuming anything.
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.data.get(self.index + offset).copied()
    }

    /// Returns true if the unread bytes start with `prefix`.
    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.data[self.index..].starts_with(prefix)
    }

    /// Try to read a byte starting at the current index.
    pub fn read(&mut self) -> Result<u8, SjsonError> {
        match self.peek() {
            Some(byte) => {
                self.advance(byte);
                Ok(byte)
            }
            None => Err(self.end_of_stream()),
        }
    }

    /// Skip `count` bytes, failing if the stream ends first.
    pub fn skip(&mut self, count: usize) -> Result<(), SjsonError> {
        for _ in 0..count {
            self.read()?;
        }
        Ok(())
    }

    /// Consume `expected` or fail with an "Expected to read" error at the
    /// current location.
    pub fn consume(&mut self, expected: &[u8]) -> Result<(), SjsonError> {
        if !self.starts_with(expected) {
            return Err(self.error(format!(
                "Expected to read '{}'",
                String::from_utf8_lossy(expected)
            )));
        }
        self.skip(expected.len())
    }

    /// Build a parse error located at the next unread byte.
    pub fn error(&self, msg: impl Into<String>) -> SjsonError {
        SjsonError::at(msg, self.location)
    }

    pub(crate) fn end_of_stream(&self) -> SjsonError {
        self.error("Unexpected end-of-stream")
    }

    fn advance(&mut self, byte: u8) {
        self.index += 1;
        if byte == b'\n' {
            self.location.line += 1;
            self.location.column = 1;
        } else {
            self.location.column += 1;
        }
    }
}

#[test]
fn read_tracks_lines_and_columns() {
    let mut stream = InputStream::new(b"ab\ncd");
    assert_eq!(stream.location(), Location { line: 1, column: 1 });
    stream.skip(2).unwrap();
    assert_eq!(stream.location(), Location { line: 1, column: 3 });
    assert_eq!(stream.read(), Ok(b'\n'));
    assert_eq!(stream.location(), Location { line: 2, column: 1 });
    assert_eq!(stream.read(), Ok(b'c'));
    assert_eq!(stream.location(), Location { line: 2, column: 2 });
}

#[test]
fn read_past_end() {
    let mut stream = InputStream::new(b"x");
    assert_eq!(stream.read(), Ok(b'x'));
    assert!(stream.is_at_end());
    let err = stream.read().unwrap_err();
    assert_eq!(err.location(), Some(Location { line: 1, column: 2 }));
}

#[test]
fn peek_does_not_consume() {
    let stream = InputStream::new(b"[=[");
    assert_eq!(stream.peek(), Some(b'['));
    assert_eq!(stream.peek_at(1), Some(b'='));
    assert_eq!(stream.peek_at(3), None);
    assert!(stream.starts_with(b"[=["));
    assert_eq!(stream.index(), 0);
}

#[test]
fn consume_mismatch() {
    let mut stream = InputStream::new(b"trve");
    let err = stream.consume(b"true").unwrap_err();
    assert_eq!(err.to_string(), "Expected to read 'true' at line 1, column 1");
}
