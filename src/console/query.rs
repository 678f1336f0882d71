//! Cursor position queries in program output.
//!
//! Prompt libraries ask the terminal where the cursor is (`ESC[6n`) and block
//! until it answers. Nothing sits on the other end of the pty, so the console
//! answers from the emulated screen.
//!
//! Output is UTF-8, so the 8-bit CSI introducer is never recognized: `0x9b`
//! only ever shows up as a continuation byte.

use super::Position;

const ESC: u8 = 0x1b;

// Longest parameter run worth tracking; anything longer is not a query.
const MAX_PARAMS: usize = 16;

/// Query kinds a prompt may send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CursorQuery {
    /// `ESC[6n`, answered with `ESC[row;colR`.
    Position,
    /// `ESC[?6n`, answered with `ESC[?row;colR`.
    PrivatePosition,
}

impl CursorQuery {
    /// Reply for a cursor at `cursor`, in 1-based terminal coordinates.
    pub(crate) fn reply(self, cursor: Position) -> Vec<u8> {
        let row = cursor.row.saturating_add(1);
        let col = cursor.col.saturating_add(1);
        match self {
            CursorQuery::Position => format!("\x1b[{row};{col}R").into_bytes(),
            CursorQuery::PrivatePosition => format!("\x1b[?{row};{col}R").into_bytes(),
        }
    }
}

enum Sequence {
    Open,
    Query(CursorQuery),
    Other,
}

/// Finds cursor queries in output arriving in arbitrary chunks.
#[derive(Debug, Default)]
pub(crate) struct QueryScanner {
    // Escape sequence still open at the end of the previous chunk.
    open: Vec<u8>,
}

impl QueryScanner {
    /// Queries completed in `chunk`, each with the offset just past it.
    pub(crate) fn scan(&mut self, chunk: &[u8]) -> Vec<(usize, CursorQuery)> {
        let mut found = Vec::new();

        for (offset, &byte) in chunk.iter().enumerate() {
            if byte == ESC {
                self.open.clear();
                self.open.push(byte);
                continue;
            }
            if self.open.is_empty() {
                continue;
            }

            self.open.push(byte);
            match classify(&self.open) {
                Sequence::Open => {}
                Sequence::Query(query) => {
                    found.push((offset + 1, query));
                    self.open.clear();
                }
                Sequence::Other => self.open.clear(),
            }
        }

        found
    }
}

fn classify(sequence: &[u8]) -> Sequence {
    let [ESC, rest @ ..] = sequence else {
        return Sequence::Other;
    };
    let [b'[', body @ ..] = rest else {
        return Sequence::Other;
    };
    let Some((&last, params)) = body.split_last() else {
        return Sequence::Open;
    };

    match last {
        0x20..=0x3f if body.len() <= MAX_PARAMS => Sequence::Open,
        b'n' => match params {
            b"6" => Sequence::Query(CursorQuery::Position),
            b"?6" => Sequence::Query(CursorQuery::PrivatePosition),
            _ => Sequence::Other,
        },
        _ => Sequence::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_query_after_prompt_text() {
        let mut scanner = QueryScanner::default();
        let chunk = b"? Name: \x1b[6n";
        assert_eq!(scanner.scan(chunk), vec![(chunk.len(), CursorQuery::Position)]);
    }

    #[test]
    fn finds_every_query_in_a_chunk() {
        let mut scanner = QueryScanner::default();
        let found = scanner.scan(b"\x1b[6nab\x1b[?6n");
        assert_eq!(
            found,
            vec![(4, CursorQuery::Position), (11, CursorQuery::PrivatePosition)]
        );
    }

    #[test]
    fn query_split_across_reads() {
        let mut scanner = QueryScanner::default();
        assert!(scanner.scan(b"\x1b").is_empty());
        assert!(scanner.scan(b"[6").is_empty());
        assert_eq!(scanner.scan(b"n!"), vec![(1, CursorQuery::Position)]);
    }

    #[test]
    fn styling_and_status_reports_are_not_queries() {
        let mut scanner = QueryScanner::default();
        assert!(scanner.scan(b"\x1b[0;1;36m> GitHub.com\x1b[0m").is_empty());
        assert!(scanner.scan(b"\x1b[5n\x1b[16n").is_empty());
    }

    #[test]
    fn utf8_continuation_byte_is_not_an_introducer() {
        let mut scanner = QueryScanner::default();
        // U+201B encodes as E2 80 9B.
        assert!(scanner.scan("\u{201b}6n".as_bytes()).is_empty());
    }

    #[test]
    fn reply_is_one_based() {
        assert_eq!(CursorQuery::Position.reply(Position::new(4, 9)), b"\x1b[5;10R");
        assert_eq!(
            CursorQuery::PrivatePosition.reply(Position::new(0, 0)),
            b"\x1b[?1;1R"
        );
    }
}
