//! The player command language.
//!
//! One command per line:
//!
//! ```text
//! statement ::= selection index end
//! selection ::= 'p' | 'd'
//! index     ::= digit { digit }
//! end       ::= end of input
//! ```
//!
//! `p 3` selects pwner column 3, `d 5` selects matrix row 5. Whitespace between
//! tokens is insignificant.

mod parser;
mod scanner;

pub use parser::{parse, ParseError, SelectionKind, SelectionStatement};
pub use scanner::{Scanner, Token};
