//! VBA tokenizer.
//!
//! Line continuations are folded into whitespace here, comments become [`TokenKind::Comment`]
//! tokens (stripped by [`significant_tokens`] before any grammar rule runs), and keywords are
//! classified case-insensitively before identifiers.

use std::sync::OnceLock;

use regex::Regex;

use crate::span::{Position, Span};
use crate::token::{Keyword, LexErrorKind, Punct, Token, TokenKind};

/// Longest body (between the hash marks) we are willing to treat as a date literal.
const MAX_DATE_LITERAL_CHARS: usize = 40;

/// Tokenize a whole module. Never fails: problems become [`TokenKind::Error`] tokens.
///
/// The returned stream always ends with exactly one [`TokenKind::Eof`] token.
pub fn tokenize(source: &str) -> Vec<Token> {
    let tokens = Lexer::new(source).run();
    log::trace!("tokenized {} bytes into {} tokens", source.len(), tokens.len());
    tokens
}

/// Drop comment tokens. This is the filtering pass that keeps comments out of the grammar.
pub fn significant_tokens(tokens: &[Token]) -> Vec<Token> {
    tokens
        .iter()
        .filter(|t| t.kind != TokenKind::Comment)
        .cloned()
        .collect()
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: u32,
    col: u32,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            col: 1,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Token> {
        loop {
            let (leading_space, continued) = self.skip_whitespace_and_continuations();
            let start = self.position();
            let Some(ch) = self.peek_char() else {
                self.push(TokenKind::Eof, start, leading_space, continued);
                break;
            };

            let kind = match ch {
                '\r' | '\n' => {
                    self.bump();
                    if ch == '\r' && self.peek_char() == Some('\n') {
                        self.bump();
                    }
                    TokenKind::Newline
                }
                '\'' => {
                    self.skip_to_line_end();
                    TokenKind::Comment
                }
                '"' => self.lex_string(),
                '_' => self.lex_underscore(),
                '[' => self.lex_bracket_name(),
                '#' => self.lex_hash(),
                '&' if self.at_radix_prefix() => self.lex_radix_number(),
                '$' if self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => {
                    self.bump();
                    self.lex_decimal_number()
                }
                '.' if self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => {
                    self.lex_decimal_number()
                }
                c if c.is_ascii_digit() => self.lex_decimal_number(),
                c if is_ident_start(c) => self.lex_word(),
                _ => self.lex_punct(),
            };
            self.push(kind, start, leading_space, continued);
        }
        self.tokens
    }

    fn push(&mut self, kind: TokenKind, start: Position, leading_space: bool, continued: bool) {
        let end = self.position();
        self.tokens.push(Token {
            kind,
            text: self.src[start.offset..end.offset].to_string(),
            span: Span::new(start, end),
            had_preceding_continuation: continued,
            leading_space,
        });
    }

    fn position(&self) -> Position {
        Position::new(self.pos, self.line, self.col)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.pos += ch.len_utf8();
        if ch == '\n' || (ch == '\r' && self.peek_char() != Some('\n')) {
            self.line += 1;
            self.col = 1;
        } else if ch != '\r' {
            self.col += 1;
        }
        Some(ch)
    }

    fn bump_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek_char().is_some_and(&pred) {
            self.bump();
        }
    }

    fn skip_to_line_end(&mut self) {
        self.bump_while(|c| c != '\n' && c != '\r');
    }

    /// Skips horizontal whitespace and folds `_` + newline continuations.
    ///
    /// Returns `(leading_space, had_continuation)` for the token that follows.
    fn skip_whitespace_and_continuations(&mut self) -> (bool, bool) {
        let mut leading_space = false;
        let mut continued = false;
        loop {
            match self.peek_char() {
                Some(c) if is_horizontal_space(c) => {
                    self.bump();
                    leading_space = true;
                }
                Some('_') => {
                    let Some(len) = self.continuation_len() else {
                        break;
                    };
                    for _ in 0..len {
                        self.bump();
                    }
                    continued = true;
                }
                _ => break,
            }
        }
        (leading_space, continued)
    }

    /// Number of chars making up a valid continuation at the cursor (`_`, trailing blanks and
    /// the line break), or `None` when the `_` is not a continuation.
    fn continuation_len(&self) -> Option<usize> {
        let mut chars = self.rest().chars();
        if chars.next() != Some('_') {
            return None;
        }
        let mut len = 1;
        for c in chars.by_ref() {
            len += 1;
            match c {
                c if is_horizontal_space(c) => continue,
                '\n' => return Some(len),
                '\r' => {
                    if self.rest().chars().nth(len) == Some('\n') {
                        return Some(len + 1);
                    }
                    return Some(len);
                }
                _ => return None,
            }
        }
        None
    }

    /// A `_` that did not fold as a continuation: either the start of an identifier
    /// (`_tmp`), or a misplaced continuation marker.
    fn lex_underscore(&mut self) -> TokenKind {
        if self.peek_nth(1).is_some_and(is_ident_continue) {
            return self.lex_word();
        }
        self.bump();
        TokenKind::Error(LexErrorKind::InvalidLineContinuation)
    }

    fn lex_string(&mut self) -> TokenKind {
        self.bump();
        loop {
            match self.peek_char() {
                Some('"') => {
                    self.bump();
                    if self.peek_char() == Some('"') {
                        self.bump();
                        continue;
                    }
                    return TokenKind::StringLiteral;
                }
                Some('\n' | '\r') | None => {
                    return TokenKind::Error(LexErrorKind::UnterminatedString);
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    fn lex_bracket_name(&mut self) -> TokenKind {
        let body_len = self.rest()[1..]
            .chars()
            .take_while(|&c| c != ']' && c != '\n' && c != '\r')
            .count();
        let closed = self.rest()[1..].chars().nth(body_len) == Some(']');
        self.bump();
        for _ in 0..body_len {
            self.bump();
        }
        if closed {
            self.bump();
            TokenKind::Identifier
        } else {
            TokenKind::Error(LexErrorKind::UnterminatedBracketName)
        }
    }

    /// `#` starts a date literal when a matching `#` closes a date/time-shaped body on the same
    /// line; otherwise it is punctuation (file numbers, directives).
    fn lex_hash(&mut self) -> TokenKind {
        let body: String = self.rest()[1..]
            .chars()
            .take_while(|&c| c != '#' && c != '\n' && c != '\r')
            .take(MAX_DATE_LITERAL_CHARS + 1)
            .collect();
        let closed = body.chars().count() <= MAX_DATE_LITERAL_CHARS
            && self.rest()[1 + body.len()..].starts_with('#');
        if closed && date_body_regex().is_match(&body) {
            self.bump();
            for _ in body.chars() {
                self.bump();
            }
            self.bump();
            return TokenKind::DateLiteral;
        }
        self.bump();
        TokenKind::Punct(Punct::Hash)
    }

    fn at_radix_prefix(&self) -> bool {
        match (self.peek_nth(1), self.peek_nth(2)) {
            (Some('h' | 'H'), Some(c)) => c.is_ascii_hexdigit(),
            (Some('o' | 'O'), Some(c)) => ('0'..='7').contains(&c),
            _ => false,
        }
    }

    fn lex_radix_number(&mut self) -> TokenKind {
        self.bump();
        let hex = matches!(self.bump(), Some('h' | 'H'));
        if hex {
            self.bump_while(|c| c.is_ascii_hexdigit());
        } else {
            self.bump_while(|c| ('0'..='7').contains(&c));
        }
        self.lex_type_suffix(&['%', '&', '^']);
        TokenKind::NumberLiteral
    }

    fn lex_decimal_number(&mut self) -> TokenKind {
        self.bump_while(|c| c.is_ascii_digit());
        if self.peek_char() == Some('.') && self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            self.bump_while(|c| c.is_ascii_digit());
        }
        if matches!(self.peek_char(), Some('e' | 'E' | 'd' | 'D')) {
            let digit_at = match self.peek_nth(1) {
                Some('+' | '-') => 2,
                _ => 1,
            };
            if self.peek_nth(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    self.bump();
                }
                self.bump_while(|c| c.is_ascii_digit());
            }
        }
        self.lex_type_suffix(&['%', '&', '!', '#', '@', '^']);
        TokenKind::NumberLiteral
    }

    /// Consume one trailing type-declaration character when it is not glued to a following
    /// word (so `a&b` stays a concatenation).
    fn lex_type_suffix(&mut self, allowed: &[char]) {
        if let Some(c) = self.peek_char() {
            if allowed.contains(&c) && !self.peek_nth(1).is_some_and(is_suffix_blocker) {
                self.bump();
            }
        }
    }

    fn lex_word(&mut self) -> TokenKind {
        let start = self.pos;
        self.bump();
        self.bump_while(is_ident_continue);
        let word = &self.src[start..self.pos];

        if let Some(kw) = Keyword::lookup(word) {
            if kw == Keyword::Rem && self.peek_char().map_or(true, |c| !is_ident_continue(c)) {
                self.skip_to_line_end();
                return TokenKind::Comment;
            }
            // `Left$` style suffixes turn a would-be keyword into a plain identifier.
            if self.peek_char() == Some('$') {
                self.bump();
                return TokenKind::Identifier;
            }
            return TokenKind::Keyword(kw);
        }
        if word.eq_ignore_ascii_case("true") || word.eq_ignore_ascii_case("false") {
            return TokenKind::BooleanLiteral(word.eq_ignore_ascii_case("true"));
        }

        match self.peek_char() {
            Some('$') => {
                self.bump();
            }
            Some('%' | '&' | '!' | '#' | '@')
                if !self.peek_nth(1).is_some_and(is_suffix_blocker) =>
            {
                self.bump();
            }
            _ => {}
        }
        TokenKind::Identifier
    }

    fn lex_punct(&mut self) -> TokenKind {
        let Some(ch) = self.bump() else {
            return TokenKind::Eof;
        };
        let next = self.peek_char();
        let two = |this: &mut Self, p: Punct| {
            this.bump();
            TokenKind::Punct(p)
        };
        match (ch, next) {
            ('<', Some('=')) => two(self, Punct::Le),
            ('<', Some('>')) => two(self, Punct::Ne),
            ('>', Some('=')) => two(self, Punct::Ge),
            (':', Some('=')) => two(self, Punct::ColonEq),
            ('(', _) => TokenKind::Punct(Punct::LParen),
            (')', _) => TokenKind::Punct(Punct::RParen),
            (',', _) => TokenKind::Punct(Punct::Comma),
            (';', _) => TokenKind::Punct(Punct::Semicolon),
            ('.', _) => TokenKind::Punct(Punct::Dot),
            ('!', _) => TokenKind::Punct(Punct::Bang),
            (':', _) => TokenKind::Punct(Punct::Colon),
            ('=', _) => TokenKind::Punct(Punct::Eq),
            ('<', _) => TokenKind::Punct(Punct::Lt),
            ('>', _) => TokenKind::Punct(Punct::Gt),
            ('+', _) => TokenKind::Punct(Punct::Plus),
            ('-', _) => TokenKind::Punct(Punct::Minus),
            ('*', _) => TokenKind::Punct(Punct::Star),
            ('/', _) => TokenKind::Punct(Punct::Slash),
            ('\\', _) => TokenKind::Punct(Punct::Backslash),
            ('^', _) => TokenKind::Punct(Punct::Caret),
            ('&', _) => TokenKind::Punct(Punct::Amp),
            _ => TokenKind::Error(LexErrorKind::UnknownCharacter),
        }
    }
}

fn date_body_regex() -> &'static Regex {
    static DATE_BODY_RE: OnceLock<Regex> = OnceLock::new();
    DATE_BODY_RE.get_or_init(|| {
        Regex::new(
            r"(?ix)^\s*
              (?:
                \d{1,4}[/-]\d{1,2}(?:[/-]\d{1,4})?
                (?:\s+\d{1,2}(?::\d{1,2}){1,2}(?:\s*[ap]m)?)?
              |
                \d{1,2}(?::\d{1,2}){1,2}(?:\s*[ap]m)?
              |
                \d{1,2}\s*[ap]m
              )
              \s*$",
        )
        .expect("valid regex")
    })
}

fn is_horizontal_space(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\u{a0}' || c == '\u{c}'
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// A character that, right after a would-be type suffix, means the suffix char is really an
/// operator (`a&b`, `x!Field`).
fn is_suffix_blocker(c: char) -> bool {
    is_ident_continue(c) || c == '"' || c == '[' || c == '&' || c == '#'
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).into_iter().map(|t| t.kind).collect()
    }

    fn texts(src: &str) -> Vec<String> {
        tokenize(src).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn keywords_win_over_identifiers_case_insensitively() {
        assert_eq!(
            kinds("end IF elseIf Foo"),
            vec![
                TokenKind::Keyword(Keyword::End),
                TokenKind::Keyword(Keyword::If),
                TokenKind::Keyword(Keyword::ElseIf),
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn continuation_folds_into_whitespace() {
        let tokens = tokenize("x = 1 + _\n    2\n");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier,
                TokenKind::Punct(Punct::Eq),
                TokenKind::NumberLiteral,
                TokenKind::Punct(Punct::Plus),
                TokenKind::NumberLiteral,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
        let two = &tokens[4];
        assert!(two.had_preceding_continuation);
        assert!(two.leading_space);
        assert_eq!(two.span.start.line, 2);
        assert_eq!(two.span.start.column, 5);
    }

    #[test]
    fn continuation_accepts_trailing_blanks_and_crlf() {
        let tokens = tokenize("Foo a, _  \r\n b\r\n");
        assert!(tokens.iter().all(|t| !matches!(t.kind, TokenKind::Error(_))));
        assert_eq!(
            tokens.iter().filter(|t| t.kind == TokenKind::Newline).count(),
            1
        );
    }

    #[test]
    fn underscore_not_followed_by_newline_is_reported() {
        let kinds = kinds("x = a _ b\n");
        assert!(kinds.contains(&TokenKind::Error(LexErrorKind::InvalidLineContinuation)));

        let kinds = self::kinds("x = a _");
        assert!(kinds.contains(&TokenKind::Error(LexErrorKind::InvalidLineContinuation)));
    }

    #[test]
    fn comments_are_tokens_but_not_significant() {
        let tokens = tokenize("x = 1 ' trailing\nRem whole line\n");
        let comments: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Comment)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(comments, vec!["' trailing", "Rem whole line"]);
        assert!(significant_tokens(&tokens)
            .iter()
            .all(|t| t.kind != TokenKind::Comment));
    }

    #[test]
    fn rem_prefix_of_identifier_is_not_a_comment() {
        assert_eq!(
            kinds("Remaining = 1"),
            vec![
                TokenKind::Identifier,
                TokenKind::Punct(Punct::Eq),
                TokenKind::NumberLiteral,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn doubled_quote_is_an_escape() {
        let tokens = tokenize(r#"s = "say ""hi""""#);
        assert_eq!(tokens[2].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[2].string_value(), r#"say "hi""#);
    }

    #[test]
    fn unterminated_string_stops_at_line_end() {
        let tokens = tokenize("s = \"abc\nx = 1\n");
        assert_eq!(
            tokens[2].kind,
            TokenKind::Error(LexErrorKind::UnterminatedString)
        );
        assert_eq!(tokens[2].text, "\"abc");
        assert_eq!(tokens[3].kind, TokenKind::Newline);
        assert_eq!(tokens[4].text, "x");
    }

    #[test]
    fn numeric_literals_keep_their_text() {
        assert_eq!(
            texts("1 2.5 1.5E+3 &HFF &O17& 10@ $12.34 .5"),
            vec!["1", "2.5", "1.5E+3", "&HFF", "&O17&", "10@", "$12.34", ".5", ""]
        );
        assert!(tokenize("1 2.5 &HFF 10@")
            .iter()
            .take(4)
            .all(|t| t.kind == TokenKind::NumberLiteral));
    }

    #[test]
    fn date_literals_versus_file_numbers() {
        let tokens = tokenize("d = #2/15/2026#\nPrint #1, d\n");
        assert_eq!(tokens[2].kind, TokenKind::DateLiteral);
        assert_eq!(tokens[2].text, "#2/15/2026#");
        let hash = tokens
            .iter()
            .find(|t| t.kind == TokenKind::Punct(Punct::Hash))
            .expect("file number hash");
        assert_eq!(hash.span.start.line, 2);

        let tokens = tokenize("t = #10:30:00 PM#");
        assert_eq!(tokens[2].kind, TokenKind::DateLiteral);
    }

    #[test]
    fn type_suffixes_stay_on_identifiers() {
        assert_eq!(texts("Left$(s, 1)")[0], "Left$");
        assert_eq!(texts("n& = 1")[0], "n&");
        // Glued operand: `&` is concatenation, not a suffix.
        assert_eq!(texts("a&b"), vec!["a", "&", "b", ""]);
        // `!` before a name is bang access.
        assert_eq!(texts("rs!Name"), vec!["rs", "!", "Name", ""]);
    }

    #[test]
    fn booleans_and_operators() {
        assert_eq!(
            kinds("True <> False := <= >="),
            vec![
                TokenKind::BooleanLiteral(true),
                TokenKind::Punct(Punct::Ne),
                TokenKind::BooleanLiteral(false),
                TokenKind::Punct(Punct::ColonEq),
                TokenKind::Punct(Punct::Le),
                TokenKind::Punct(Punct::Ge),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unknown_characters_become_error_tokens() {
        let kinds = kinds("x = 1 ? 2");
        assert_eq!(
            kinds[3],
            TokenKind::Error(LexErrorKind::UnknownCharacter)
        );
        assert_eq!(kinds.last(), Some(&TokenKind::Eof));
    }

    #[test]
    fn bracketed_names_are_identifiers() {
        let tokens = tokenize("[A1].Value = 1");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].text, "[A1]");
    }

    #[test]
    fn positions_are_one_based() {
        let tokens = tokenize("Sub A()\n  x = 1\nEnd Sub");
        let x = tokens.iter().find(|t| t.text == "x").unwrap();
        assert_eq!((x.span.start.line, x.span.start.column), (2, 3));
        assert_eq!(x.span.start.offset, 10);
    }
}
