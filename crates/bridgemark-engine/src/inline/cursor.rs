use super::span::Span;

/// A byte cursor over a text run.
///
/// Only ASCII bytes are ever compared, so stopping anywhere the cursor
/// matched a delimiter leaves it on a char boundary.
#[derive(Clone)]
pub struct Cursor<'a> {
    /// The text being scanned.
    pub s: &'a str,
    /// Current byte index into `s`.
    pub i: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    pub fn pos(&self) -> usize {
        self.i
    }

    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.s.as_bytes().get(self.i).copied()
    }

    pub fn starts_with(&self, pat: &[u8]) -> bool {
        self.s.as_bytes()[self.i.min(self.s.len())..].starts_with(pat)
    }

    pub fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.i += 1;
        Some(b)
    }

    pub fn bump_n(&mut self, n: usize) {
        self.i += n;
    }

    /// Consumes `b` if it is next.
    pub fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.i += 1;
            true
        } else {
            false
        }
    }

    /// Consumes bytes while `pred` holds, returning the consumed span.
    pub fn eat_while(&mut self, pred: impl Fn(u8) -> bool) -> Span {
        let start = self.i;
        while let Some(b) = self.peek() {
            if !pred(b) {
                break;
            }
            self.i += 1;
        }
        Span { start, end: self.i }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_basics() {
        let mut cur = Cursor::new("hello");
        assert_eq!(cur.pos(), 0);
        assert!(!cur.eof());
        assert_eq!(cur.peek(), Some(b'h'));
        assert_eq!(cur.bump(), Some(b'h'));
        assert_eq!(cur.pos(), 1);
    }

    #[test]
    fn starts_with_past_end_is_false() {
        let mut cur = Cursor::new("||");
        assert!(cur.starts_with(b"||"));
        cur.bump_n(5);
        assert!(cur.eof());
        assert!(!cur.starts_with(b"|"));
        assert_eq!(cur.bump(), None);
    }

    #[test]
    fn eat_only_matching_byte() {
        let mut cur = Cursor::new("@!1");
        assert!(cur.eat(b'@'));
        assert!(!cur.eat(b'&'));
        assert!(cur.eat(b'!'));
        assert_eq!(cur.pos(), 2);
    }

    #[test]
    fn eat_while_returns_consumed_span() {
        let mut cur = Cursor::new("12345>");
        let digits = cur.eat_while(|b| b.is_ascii_digit());
        assert_eq!(digits, Span { start: 0, end: 5 });
        assert_eq!(cur.peek(), Some(b'>'));

        let none = cur.eat_while(|b| b.is_ascii_digit());
        assert!(none.is_empty());
    }
}
