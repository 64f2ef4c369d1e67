//! Parsing of player command lines into selection statements.

use super::scanner::{Scanner, Token};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which device a command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    /// `p` - a pwner column
    Pwner,
    /// `d` - a matrix row ("dump")
    Matrix,
}

/// A successfully parsed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionStatement {
    pub kind: SelectionKind,
    pub index: usize,
}

impl SelectionStatement {
    pub fn pwner(index: usize) -> Self {
        Self {
            kind: SelectionKind::Pwner,
            index,
        }
    }

    pub fn matrix(index: usize) -> Self {
        Self {
            kind: SelectionKind::Matrix,
            index,
        }
    }
}

impl fmt::Display for SelectionStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let selection = match self.kind {
            SelectionKind::Pwner => 'p',
            SelectionKind::Matrix => 'd',
        };
        write!(f, "{selection} {}", self.index)
    }
}

/// Malformed command text. Never fatal to the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected a selection ('p' or 'd'), found {0}")]
    ExpectedSelection(String),

    #[error("expected an index, found {0}")]
    ExpectedIndex(String),

    #[error("index {0} is too large")]
    IndexOverflow(String),

    #[error("expected end of statement, found {0}")]
    ExpectedEnd(String),
}

/// Parses one command line.
///
/// ```
/// use portdive_core::input::{parse, SelectionStatement};
///
/// assert_eq!(parse("d 2").unwrap(), SelectionStatement::matrix(2));
/// assert!(parse("d 2 extra").is_err());
/// ```
pub fn parse(line: &str) -> Result<SelectionStatement, ParseError> {
    let mut scanner = Scanner::new(line);

    let kind = match scanner.next_token() {
        Token::Selection('p') => SelectionKind::Pwner,
        Token::Selection(_) => SelectionKind::Matrix,
        other => return Err(ParseError::ExpectedSelection(other.to_string())),
    };

    let index = match scanner.next_token() {
        Token::Index(digits) => digits
            .parse::<usize>()
            .map_err(|_| ParseError::IndexOverflow(digits))?,
        other => return Err(ParseError::ExpectedIndex(other.to_string())),
    };

    match scanner.next_token() {
        Token::End => Ok(SelectionStatement { kind, index }),
        other => Err(ParseError::ExpectedEnd(other.to_string())),
    }
}

impl FromStr for SelectionStatement {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parses_valid_statements() {
        assert_eq!(parse("d 2").unwrap(), SelectionStatement::matrix(2));
        assert_eq!(parse("p 0").unwrap(), SelectionStatement::pwner(0));
        assert_eq!(parse("  p   15 ").unwrap(), SelectionStatement::pwner(15));
        assert_eq!("d007".parse::<SelectionStatement>().unwrap(), SelectionStatement::matrix(7));
    }

    #[test]
    fn test_rejects_bad_selection() {
        assert!(matches!(parse("x 1"), Err(ParseError::ExpectedSelection(_))));
        assert!(matches!(parse(""), Err(ParseError::ExpectedSelection(_))));
        assert!(matches!(parse("1 p"), Err(ParseError::ExpectedSelection(_))));
        assert!(matches!(parse("P 1"), Err(ParseError::ExpectedSelection(_))));
    }

    #[test]
    fn test_rejects_missing_or_bad_index() {
        assert!(matches!(parse("d"), Err(ParseError::ExpectedIndex(_))));
        assert!(matches!(parse("d abc"), Err(ParseError::ExpectedIndex(_))));
        assert!(matches!(parse("d -1"), Err(ParseError::ExpectedIndex(_))));
        assert!(matches!(parse("p p"), Err(ParseError::ExpectedIndex(_))));
    }

    #[test]
    fn test_rejects_overflowing_index() {
        let err = parse("p 99999999999999999999999999").unwrap_err();
        assert_eq!(err, ParseError::IndexOverflow("99999999999999999999999999".into()));
    }

    #[test]
    fn test_rejects_trailing_content() {
        assert!(matches!(parse("d 2 extra"), Err(ParseError::ExpectedEnd(_))));
        assert!(matches!(parse("d 2 3"), Err(ParseError::ExpectedEnd(_))));
        assert!(matches!(parse("p 1d"), Err(ParseError::ExpectedEnd(_))));
    }

    #[test]
    fn test_error_messages_name_the_token() {
        assert_eq!(
            parse("x 1").unwrap_err().to_string(),
            "expected a selection ('p' or 'd'), found 'x'"
        );
        assert_eq!(
            parse("d").unwrap_err().to_string(),
            "expected an index, found end of statement"
        );
    }

    #[test]
    fn test_display_round_trips() {
        let statement = SelectionStatement::pwner(3);
        assert_eq!(statement.to_string(), "p 3");
        assert_eq!(parse(&statement.to_string()).unwrap(), statement);
    }

    proptest! {
        #[test]
        fn prop_parse_never_panics(line in "\\PC{0,24}") {
            let _ = parse(&line);
        }

        #[test]
        fn prop_wellformed_lines_parse(
            pwner in any::<bool>(),
            index in 0usize..100_000,
            pad in "[ \t]{0,3}",
        ) {
            let selection = if pwner { 'p' } else { 'd' };
            let line = format!("{pad}{selection}{pad} {index}{pad}");
            let statement = parse(&line).unwrap();
            prop_assert_eq!(statement.index, index);
            prop_assert_eq!(statement.kind == SelectionKind::Pwner, pwner);
        }
    }
}
