//! Lexical analysis of a single command line.

use std::fmt;
use std::str::Chars;

/// A token produced by the [`Scanner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `p` or `d`
    Selection(char),
    /// A run of decimal digits, kept as text so overflow is reported by the parser
    Index(String),
    /// Any other non-whitespace character
    Illegal(char),
    /// End of the line
    End,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Selection(c) => write!(f, "selection '{c}'"),
            Token::Index(digits) => write!(f, "index {digits}"),
            Token::Illegal(c) => write!(f, "'{c}'"),
            Token::End => write!(f, "end of statement"),
        }
    }
}

/// Single-pass scanner over one line with a one-character pushback.
///
/// The pushback lets the digit run stop on the first non-digit without losing
/// it for the next token.
pub struct Scanner<'a> {
    chars: Chars<'a>,
    pushback: Option<char>,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars(),
            pushback: None,
        }
    }

    /// Returns the next token, skipping leading whitespace.
    pub fn next_token(&mut self) -> Token {
        let c = loop {
            match self.read() {
                None => return Token::End,
                Some(c) if c.is_whitespace() => continue,
                Some(c) => break c,
            }
        };

        match c {
            'p' | 'd' => Token::Selection(c),
            c if c.is_ascii_digit() => Token::Index(self.scan_digits(c)),
            other => Token::Illegal(other),
        }
    }

    fn scan_digits(&mut self, first: char) -> String {
        let mut digits = String::from(first);
        while let Some(c) = self.read() {
            if !c.is_ascii_digit() {
                self.unread(c);
                break;
            }
            digits.push(c);
        }
        digits
    }

    fn read(&mut self) -> Option<char> {
        self.pushback.take().or_else(|| self.chars.next())
    }

    fn unread(&mut self, c: char) {
        debug_assert!(self.pushback.is_none(), "only one character of pushback");
        self.pushback = Some(c);
    }
}

impl Iterator for Scanner<'_> {
    type Item = Token;

    /// Yields tokens up to, but not including, [`Token::End`].
    fn next(&mut self) -> Option<Token> {
        match self.next_token() {
            Token::End => None,
            token => Some(token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scans_statement() {
        let tokens: Vec<Token> = Scanner::new("p 12").collect();
        assert_eq!(tokens, vec![Token::Selection('p'), Token::Index("12".into())]);
    }

    #[test]
    fn test_whitespace_is_insignificant() {
        let tokens: Vec<Token> = Scanner::new("  d\t 7  ").collect();
        assert_eq!(tokens, vec![Token::Selection('d'), Token::Index("7".into())]);

        let tokens: Vec<Token> = Scanner::new("d7").collect();
        assert_eq!(tokens, vec![Token::Selection('d'), Token::Index("7".into())]);
    }

    #[test]
    fn test_digit_run_stops_without_losing_next_char() {
        let tokens: Vec<Token> = Scanner::new("42x").collect();
        assert_eq!(tokens, vec![Token::Index("42".into()), Token::Illegal('x')]);
    }

    #[test]
    fn test_illegal_and_unicode() {
        let tokens: Vec<Token> = Scanner::new("é ３").collect();
        assert_eq!(tokens, vec![Token::Illegal('é'), Token::Illegal('３')]);
    }

    #[test]
    fn test_end_is_sticky() {
        let mut scanner = Scanner::new(" ");
        assert_eq!(scanner.next_token(), Token::End);
        assert_eq!(scanner.next_token(), Token::End);
    }
}
