//! Source text to tree: the lexer (with its bracket and dot rewrites) and
//! the right-to-left parser.

pub mod lexer;
pub mod parser;

pub use lexer::{tokenize, QuoteMarker, Token, TokenKind};
pub use parser::{parse, ParsedProgram};
