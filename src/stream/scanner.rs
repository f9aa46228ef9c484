//! Line scanning for mirrored log output

use std::borrow::Cow;
use thiserror::Error;

/// Default upper bound for a single scanned line
pub const DEFAULT_MAX_LINE_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("token too long: line of {len} bytes exceeds limit of {limit} bytes")]
    TokenTooLong { len: usize, limit: usize },
}

/// Log text for a scanned line.
///
/// Valid UTF-8 is kept as is. Bytes that do not decode are written as `\xNN`
/// escapes, so a character split across two writes still reaches the log.
pub fn decode_line(line: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(line) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            let mut text = String::with_capacity(line.len() + 8);
            for chunk in line.utf8_chunks() {
                text.push_str(chunk.valid());
                text.extend(chunk.invalid().escape_ascii().map(char::from));
            }
            Cow::Owned(text)
        }
    }
}

/// Splits byte slices into lines.
///
/// A line ends at `\n`; a `\r` right before the newline is dropped. A final
/// fragment without a newline is still a line, but nothing is yielded for the
/// empty remainder after a trailing newline.
#[derive(Debug, Clone, Copy)]
pub struct LineScanner {
    max_line_bytes: usize,
}

impl LineScanner {
    pub fn new(max_line_bytes: usize) -> Self {
        Self { max_line_bytes }
    }

    pub fn max_line_bytes(&self) -> usize {
        self.max_line_bytes
    }

    pub fn lines<'a>(&self, bytes: &'a [u8]) -> Lines<'a> {
        Lines {
            rest: bytes,
            limit: self.max_line_bytes,
            failed: false,
        }
    }
}

impl Default for LineScanner {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_BYTES)
    }
}

/// Iterator returned by [`LineScanner::lines`]. Stops after the first error.
pub struct Lines<'a> {
    rest: &'a [u8],
    limit: usize,
    failed: bool,
}

impl<'a> Iterator for Lines<'a> {
    type Item = Result<&'a [u8], ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.rest.is_empty() {
            return None;
        }

        let (line, rest) = match self.rest.iter().position(|&b| b == b'\n') {
            Some(end) => (&self.rest[..end], &self.rest[end + 1..]),
            None => (self.rest, &self.rest[self.rest.len()..]),
        };

        if line.len() > self.limit {
            self.failed = true;
            return Some(Err(ScanError::TokenTooLong {
                len: line.len(),
                limit: self.limit,
            }));
        }

        self.rest = rest;
        Some(Ok(line.strip_suffix(b"\r").unwrap_or(line)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(input: &[u8]) -> Vec<&[u8]> {
        LineScanner::default()
            .lines(input)
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_splits_on_newlines() {
        assert_eq!(
            scan(b"expected\nstdout\n"),
            vec![&b"expected"[..], &b"stdout"[..]]
        );
    }

    #[test]
    fn test_final_fragment_without_newline() {
        assert_eq!(scan(b"one\ntwo"), vec![&b"one"[..], &b"two"[..]]);
        assert_eq!(scan(b"O"), vec![&b"O"[..]]);
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(scan(b"").is_empty());
    }

    #[test]
    fn test_inner_empty_lines_are_kept() {
        assert_eq!(
            scan(b"a\n\nb\n\n"),
            vec![&b"a"[..], &b""[..], &b"b"[..], &b""[..]]
        );
        assert_eq!(scan(b"\n"), vec![&b""[..]]);
    }

    #[test]
    fn test_drops_carriage_return() {
        assert_eq!(scan(b"dos\r\nline\r\n"), vec![&b"dos"[..], &b"line"[..]]);
    }

    #[test]
    fn test_line_over_limit_fails() {
        let scanner = LineScanner::new(4);
        let results: Vec<_> = scanner.lines(b"ok\ntoolong\nnever").collect();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0], Ok(&b"ok"[..]));
        assert_eq!(
            results[1],
            Err(ScanError::TokenTooLong { len: 7, limit: 4 })
        );
    }

    #[test]
    fn test_decode_line_keeps_valid_text() {
        assert!(matches!(decode_line("héllo".as_bytes()), Cow::Borrowed("héllo")));
    }

    #[test]
    fn test_decode_line_escapes_undecodable_bytes() {
        assert_eq!(decode_line(b"caf\xc3"), "caf\\xc3");
        assert_eq!(decode_line(b"\xa9 ok \xff"), "\\xa9 ok \\xff");
        assert_eq!(decode_line(b"\xc3\xa9\xc3"), "é\\xc3");
    }
}
