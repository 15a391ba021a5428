//! File I/O statements and `Debug.Print`.
//!
//! None of `Open`, `Close`, `Print`, `Write`, `Input`, `Line`, `Put`, `Seek`, `Lock`, `Unlock`
//! or `Width` are reserved words, so each statement is only recognized where the resolver says
//! the word is being used as a statement (`Print #1, x` but not `Print = 3`).

use crate::ast::{Expr, FileIoStmt, OpenMode, OutputItem, OutputSeparator, StmtKind};
use crate::diagnostics::{ParseError, RecoveryKind};
use crate::resolver;
use crate::token::{Keyword, Punct};

use super::{ExprContext, Parser};

/// Statements recognized only so they can be reported instead of misparsed as calls.
const UNSUPPORTED_FILE_STATEMENTS: &[&str] = &["Seek", "Lock", "Unlock", "Width"];

impl<'a> Parser<'a> {
    /// A file I/O statement at the current position, or `None` when the head word is an
    /// ordinary name.
    pub(crate) fn try_parse_file_io(&mut self) -> Result<Option<StmtKind>, ParseError> {
        let stmt = if resolver::is_open_statement(&self.tokens, self.pos) {
            self.pos += 1;
            self.parse_open()?
        } else if resolver::is_statement_word(&self.tokens, self.pos, "Close") {
            self.pos += 1;
            let mut file_numbers = Vec::new();
            if !self.at_statement_end() {
                loop {
                    file_numbers.push(self.parse_file_number()?);
                    if !self.eat_punct(Punct::Comma) {
                        break;
                    }
                }
            }
            FileIoStmt::Close { file_numbers }
        } else if self.file_statement("Print") {
            self.pos += 1;
            let file_number = self.parse_file_number()?;
            let items = if self.eat_punct(Punct::Comma) {
                self.parse_output_list()?
            } else {
                Vec::new()
            };
            FileIoStmt::Print { file_number, items }
        } else if self.file_statement("Write") {
            self.pos += 1;
            let file_number = self.parse_file_number()?;
            let items = if self.eat_punct(Punct::Comma) {
                self.parse_output_list()?
            } else {
                Vec::new()
            };
            FileIoStmt::Write { file_number, items }
        } else if self.file_statement("Input") {
            self.pos += 1;
            let file_number = self.parse_file_number()?;
            let mut targets = Vec::new();
            while self.eat_punct(Punct::Comma) {
                targets.push(self.parse_expr(ExprContext::LvalueTarget)?);
            }
            if targets.is_empty() {
                return Err(self.unexpected("`,` and a variable"));
            }
            FileIoStmt::Input {
                file_number,
                targets,
            }
        } else if resolver::is_statement_word(&self.tokens, self.pos, "Line")
            && self.peek_at(1).is_word("Input")
            && resolver::file_number_follows(&self.tokens, self.pos + 2)
        {
            self.pos += 2;
            let file_number = self.parse_file_number()?;
            self.expect_punct(Punct::Comma)?;
            let target = self.parse_expr(ExprContext::LvalueTarget)?;
            FileIoStmt::LineInput {
                file_number,
                target,
            }
        } else if self.at_keyword(Keyword::Get)
            && resolver::file_number_follows(&self.tokens, self.pos + 1)
        {
            self.pos += 1;
            let (file_number, record, target) = self.parse_record_access()?;
            FileIoStmt::Get {
                file_number,
                record,
                target,
            }
        } else if self.file_statement("Put") {
            self.pos += 1;
            let (file_number, record, source) = self.parse_record_access()?;
            FileIoStmt::Put {
                file_number,
                record,
                source,
            }
        } else if let Some(word) = UNSUPPORTED_FILE_STATEMENTS
            .iter()
            .find(|w| self.file_statement(w))
        {
            return Err(ParseError::unsupported(
                format!("`{word}` statements are not supported"),
                self.current_span(),
            ));
        } else {
            return Ok(None);
        };
        Ok(Some(StmtKind::FileIo(stmt)))
    }

    /// `word #n ...`.
    fn file_statement(&self, word: &str) -> bool {
        resolver::is_statement_word(&self.tokens, self.pos, word)
            && resolver::file_number_follows(&self.tokens, self.pos + 1)
    }

    /// `[#]n`.
    fn parse_file_number(&mut self) -> Result<Expr, ParseError> {
        self.eat_punct(Punct::Hash);
        self.parse_expr(ExprContext::Value)
    }

    /// `#n, [record], variable` shared by `Get` and `Put`.
    fn parse_record_access(&mut self) -> Result<(Expr, Option<Expr>, Expr), ParseError> {
        let file_number = self.parse_file_number()?;
        self.expect_punct(Punct::Comma)?;
        let record = if self.at_punct(Punct::Comma) {
            None
        } else {
            Some(self.parse_expr(ExprContext::Value)?)
        };
        self.expect_punct(Punct::Comma)?;
        let variable = self.parse_expr(ExprContext::LvalueTarget)?;
        Ok((file_number, record, variable))
    }

    /// `Open path For mode [Access ...] [Lock ...] As [#]n [Len = reclen]`; `Open` consumed.
    fn parse_open(&mut self) -> Result<FileIoStmt, ParseError> {
        let path = self.parse_expr(ExprContext::Value)?;
        self.expect_keyword(Keyword::For)?;
        let mode = if self.eat_word("Input") {
            OpenMode::Input
        } else if self.eat_word("Output") {
            OpenMode::Output
        } else if self.eat_word("Append") {
            OpenMode::Append
        } else if self.eat_word("Binary") {
            OpenMode::Binary
        } else if self.eat_word("Random") {
            OpenMode::Random
        } else {
            return Err(self.unexpected("`Input`, `Output`, `Append`, `Binary` or `Random`"));
        };

        if !self.at_keyword(Keyword::As) && !self.at_statement_end() {
            // `Access Read Write`, `Lock Shared`, ...: recognized, skipped, reported.
            let clause = self.current_span();
            while !self.at_keyword(Keyword::As) && !self.at_statement_end() {
                self.pos += 1;
            }
            self.report(
                ParseError::unsupported(
                    "`Access`/`Lock` clauses of `Open` are not supported and were ignored",
                    clause.to(self.prev_span()),
                ),
                RecoveryKind::Skipped,
            );
        }

        self.expect_keyword(Keyword::As)?;
        let file_number = self.parse_file_number()?;
        let record_length = if self.eat_word("Len") {
            self.expect_punct(Punct::Eq)?;
            Some(self.parse_expr(ExprContext::Value)?)
        } else {
            None
        };
        Ok(FileIoStmt::Open {
            path,
            mode,
            file_number,
            record_length,
        })
    }

    /// `a; b, c;` after `Print #n,`, `Write #n,` or `Debug.Print`.
    pub(crate) fn parse_output_list(&mut self) -> Result<Vec<OutputItem>, ParseError> {
        let mut items = Vec::new();
        while !self.at_statement_end() {
            let start = self.pos;
            let expr = if self.at_punct(Punct::Semicolon) || self.at_punct(Punct::Comma) {
                None
            } else {
                Some(self.parse_expr(ExprContext::Value)?)
            };
            let separator = if self.eat_punct(Punct::Semicolon) {
                Some(OutputSeparator::Semicolon)
            } else if self.eat_punct(Punct::Comma) {
                Some(OutputSeparator::Comma)
            } else {
                None
            };
            items.push(OutputItem {
                expr,
                separator,
                span: self.span_from(start),
            });
            if separator.is_none() {
                break;
            }
        }
        Ok(items)
    }
}
