//! `formula-vba-syntax` parses VBA/VB6 module source (`.bas`, `.cls`, `.frm` exports) into a
//! typed syntax tree.
//!
//! The pipeline is lexer → statement parser → expression parser, with the ambiguity resolver
//! consulted wherever VBA reuses a token for two meanings (`=` as assignment or comparison,
//! `If` inline or block, `End` alone or as a terminator, `Foo (x)` as a call or a parenthesized
//! argument). Parsing is error tolerant: every input yields a [`Module`] and a list of
//! [`Diagnostic`]s, and a broken line never hides the rest of the file.
//!
//! ```
//! let parsed = formula_vba_syntax::parse_module("Sub Main()\n    MsgBox \"hi\"\nEnd Sub\n");
//! assert!(parsed.diagnostics.is_empty());
//! assert_eq!(parsed.module.procedures[0].name.name, "Main");
//! ```

mod ast;
mod diagnostics;
mod lexer;
mod options;
mod parser;
mod printer;
mod resolver;
mod span;
mod token;

pub use ast::*;
pub use diagnostics::{Diagnostic, ErrorKind, ParseError, RecoveryKind, Severity, SourceError};
pub use lexer::{significant_tokens, tokenize};
pub use options::{Associativity, ParseOptions};
pub use parser::{
    parse_expression, parse_expression_at, parse_module, parse_module_bytes,
    parse_module_with_options, ParsedModule,
};
pub use printer::{print_expr, print_module};
pub use span::{Position, Span};
pub use token::{Keyword, LexErrorKind, Punct, Token, TokenKind};
