use std::fmt::Write;

use crate::dots::label::Dot;

/// A record serializable as one CSV row (fields only; the stream owns the
/// newline terminator).
pub trait Row {
    fn write_row(&self, out: &mut String);
}

impl Row for Dot {
    // Floats print in shortest round-trip form; none of the fields can
    // contain a delimiter, so no quoting is needed here.
    fn write_row(&self, out: &mut String) {
        let _ = write!(out, "{},{},{}", self.x, self.y, self.category.key());
    }
}

impl Row for Vec<String> {
    fn write_row(&self, out: &mut String) {
        for (i, field) in self.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            push_field(out, field);
        }
    }
}

/// Append one CSV field, quoting (with doubled inner quotes) when the field
/// embeds a delimiter, quote, or line break.
pub fn push_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\n', '\r']) {
        out.push('"');
        for ch in field.chars() {
            if ch == '"' {
                out.push('"');
            }
            out.push(ch);
        }
        out.push('"');
    } else {
        out.push_str(field);
    }
}

/// Bounded-memory adapter from a lazy record sequence to a readable stream
/// of serialized CSV rows.
///
/// Each pull serializes at most `chunk_size` upstream records into an
/// internal text buffer; the buffer grows only by whole rows and shrinks
/// only from the front as rows or character runs are consumed, so retained
/// memory is O(chunk_size) regardless of how many records flow through.
///
/// Two consumption modes share the one buffer, as two named methods:
/// [`CsvStream::next_line`] and [`CsvStream::read`]. Once the buffer is
/// empty and the upstream is exhausted, both permanently return `Ok(None)`;
/// upstream errors surface as `Err` and are distinct from exhaustion.
pub struct CsvStream<I> {
    src: I,
    chunk_size: usize,
    buffer: String,
    exhausted: bool,
}

impl<I, R, E> CsvStream<I>
where
    I: Iterator<Item = Result<R, E>>,
    R: Row,
{
    pub fn new(src: I, chunk_size: usize) -> Self {
        assert!(chunk_size >= 1, "chunk_size must be at least 1");
        Self { src, chunk_size, buffer: String::new(), exhausted: false }
    }

    /// Current buffered text length, in bytes. Stays O(chunk_size) rows.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Pull up to `chunk_size` records and append them as rows. Returns
    /// whether anything was appended; pulling nothing marks exhaustion.
    fn extend_buffer(&mut self) -> Result<bool, E> {
        let mut pulled = false;
        for _ in 0..self.chunk_size {
            match self.src.next() {
                Some(Ok(record)) => {
                    record.write_row(&mut self.buffer);
                    self.buffer.push('\n');
                    pulled = true;
                }
                Some(Err(err)) => return Err(err),
                None => {
                    self.exhausted = true;
                    break;
                }
            }
        }
        Ok(pulled)
    }

    /// Pop the next full row, newline stripped.
    ///
    /// A trailing unterminated remainder is returned once after the
    /// upstream exhausts; thereafter `Ok(None)`.
    pub fn next_line(&mut self) -> Result<Option<String>, E> {
        loop {
            if let Some(i) = self.buffer.find('\n') {
                let line = self.buffer[..i].to_string();
                self.buffer.drain(..=i);
                return Ok(Some(line));
            }
            if self.exhausted || !self.extend_buffer()? {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(std::mem::take(&mut self.buffer)));
            }
        }
    }

    /// Pop up to `n` characters, extending from upstream as needed; fewer
    /// than `n` only at end-of-sequence.
    pub fn read(&mut self, n: usize) -> Result<Option<String>, E> {
        while !self.exhausted && self.buffer.chars().count() < n {
            self.extend_buffer()?;
        }
        // A zero-length read on a live stream is empty, not end-of-sequence.
        if self.buffer.is_empty() && self.exhausted {
            return Ok(None);
        }
        let cut = self
            .buffer
            .char_indices()
            .nth(n)
            .map_or(self.buffer.len(), |(i, _)| i);
        let head = self.buffer[..cut].to_string();
        self.buffer.drain(..cut);
        Ok(Some(head))
    }
}
