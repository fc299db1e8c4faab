use std::collections::VecDeque;

/// Lazily buffered character stream the lexer scans.
///
/// Characters are pulled from the source only when they are looked at and stay in the buffer until
/// they are trimmed, so the stream can be rewound to any [`Checkpoint`] taken after the last
/// [`trim`](CharStream::trim).
pub struct CharStream<I: Iterator<Item = char>> {
    source: I,
    buffer: VecDeque<char>,
    /// Absolute offset of the first character in the buffer.
    base: usize,
    /// Offset of the cursor relative to `base`.
    cursor: usize,
    line: usize,
    column: usize,
}

/// A position in a [`CharStream`]. Lines and columns start at 1, the offset is in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl<I: Iterator<Item = char>> CharStream<I> {
    /// Creates a new [`CharStream`].
    pub fn new(source: I) -> Self {
        Self {
            source,
            buffer: VecDeque::new(),
            base: 0,
            cursor: 0,
            line: 1,
            column: 1,
        }
    }

    /// Makes sure the buffer holds the character at `offset` from the cursor, if the source has
    /// one.
    fn fill(&mut self, offset: usize) -> bool {
        while self.buffer.len() <= self.cursor + offset {
            match self.source.next() {
                Some(c) => self.buffer.push_back(c),
                None => return false,
            }
        }

        true
    }

    /// Returns the character `offset` positions past the cursor without consuming anything.
    pub fn peek_at(&mut self, offset: usize) -> Option<char> {
        if !self.fill(offset) {
            return None;
        }

        self.buffer.get(self.cursor + offset).copied()
    }

    /// Whether every character of the source has been consumed.
    pub fn is_eof(&mut self) -> bool {
        self.peek_at(0).is_none()
    }

    /// Consumes a single character.
    pub fn advance(&mut self) -> Option<char> {
        let c = self.peek_at(0)?;
        self.cursor += 1;

        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(c)
    }

    /// Consumes `n` characters and returns them, stopping early at the end of the source.
    pub fn advance_by(&mut self, n: usize) -> String {
        (0..n).map_while(|_| self.advance()).collect()
    }

    /// Returns the current position.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            offset: self.base + self.cursor,
            line: self.line,
            column: self.column,
        }
    }

    /// Moves the cursor back to `checkpoint`.
    ///
    /// # Panics
    ///
    /// When the characters at `checkpoint` have been trimmed already or `checkpoint` lies past the
    /// buffered characters.
    pub fn rewind(&mut self, checkpoint: Checkpoint) {
        assert!(
            checkpoint.offset >= self.base,
            "cannot rewind to a trimmed part of the stream"
        );
        assert!(
            checkpoint.offset - self.base <= self.buffer.len(),
            "cannot rewind to a position that has not been read yet"
        );

        self.cursor = checkpoint.offset - self.base;
        self.line = checkpoint.line;
        self.column = checkpoint.column;
    }

    /// Drops the consumed characters from the buffer.
    pub fn trim(&mut self) {
        self.buffer.drain(..self.cursor);
        self.base += self.cursor;
        self.cursor = 0;
    }

    /// Returns the characters consumed since `from`.
    pub fn slice(&self, from: Checkpoint) -> String {
        assert!(
            from.offset >= self.base,
            "cannot slice a trimmed part of the stream"
        );

        self.buffer
            .range(from.offset - self.base..self.cursor)
            .collect()
    }
}

impl<I: Iterator<Item = char>> Iterator for CharStream<I> {
    type Item = char;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}
