//! Recursive-descent parser with one-token lookahead.
//!
//! Word atoms implement quoted concatenation: any run of text, escapes,
//! quoted sections, and variables with no intervening space collapses into a
//! single argument expression. Double-quoted content stays a child list so
//! variable expansion happens at evaluation time, inline with surrounding
//! literal text.

use crate::ast::{Command, Expr, Pipeline, RedirectMode, Redirects, Root, Stmt, Target};
use crate::error::ParseError;
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

/// Lex and parse one input line.
pub fn parse(input: &str) -> Result<Root, ParseError> {
    Parser::new(Lexer::new(input))?.parse_root()
}

pub struct Parser {
    lexer: Lexer,
    prev: Token,
    cur: Token,
    peek: Token,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Result<Self, ParseError> {
        let mut parser = Self {
            lexer,
            prev: Token::new(TokenKind::Eof, "", 0),
            cur: Token::new(TokenKind::Eof, "", 0),
            peek: Token::new(TokenKind::Eof, "", 0),
        };
        parser.advance()?;
        parser.advance()?;
        Ok(parser)
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.prev = std::mem::replace(
            &mut self.cur,
            std::mem::replace(&mut self.peek, self.lexer.next_token()),
        );
        if self.cur.kind == TokenKind::Error {
            return Err(ParseError::Lex {
                message: self.cur.literal.clone(),
                pos: self.cur.pos,
            });
        }
        Ok(())
    }

    fn cur_is(&self, kind: TokenKind) -> bool {
        self.cur.kind == kind
    }

    fn skip_spaces(&mut self) -> Result<(), ParseError> {
        while self.cur_is(TokenKind::Space) {
            self.advance()?;
        }
        Ok(())
    }

    pub fn parse_root(&mut self) -> Result<Root, ParseError> {
        let mut statements = Vec::new();
        loop {
            self.skip_spaces()?;
            if self.cur_is(TokenKind::Eof) {
                break;
            }
            statements.push(self.parse_statement()?);
            self.skip_spaces()?;
            match self.cur.kind {
                // Trailing `;` is fine; the loop re-checks for end of input.
                TokenKind::Semicolon => self.advance()?,
                TokenKind::Eof => break,
                _ => {
                    return Err(ParseError::UnexpectedToken {
                        expected: "';' or end of input",
                        found: self.cur.to_string(),
                        pos: self.cur.pos,
                    });
                }
            }
        }
        Ok(Root { statements })
    }

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        let first = self.parse_command()?;
        let stmt = if self.cur_is(TokenKind::Pipe) {
            Stmt::Pipeline(self.parse_pipeline(first)?)
        } else {
            Stmt::Command(first)
        };

        self.skip_spaces()?;
        if !self.cur_is(TokenKind::Ampersand) {
            return Ok(stmt);
        }
        self.advance()?;
        self.skip_spaces()?;
        if !(self.cur_is(TokenKind::Semicolon) || self.cur_is(TokenKind::Eof)) {
            return Err(ParseError::TrailingAfterBackground { pos: self.cur.pos });
        }
        Ok(Stmt::Background(Box::new(stmt)))
    }

    fn parse_pipeline(&mut self, first: Command) -> Result<Pipeline, ParseError> {
        debug_assert!(self.cur_is(TokenKind::Pipe));
        let mut commands = vec![first];
        while self.cur_is(TokenKind::Pipe) {
            let pipe_pos = self.cur.pos;
            self.advance()?;
            let command = self.parse_command()?;
            if command.redirects.stdin.is_some() {
                return Err(ParseError::PipelineStdinRedirect { pos: pipe_pos });
            }
            commands.push(command);
        }
        Ok(Pipeline { commands })
    }

    fn parse_command(&mut self) -> Result<Command, ParseError> {
        self.skip_spaces()?;
        if !is_atom_start(self.cur.kind) {
            return Err(ParseError::CommandNameExpected {
                found: self.cur.to_string(),
                pos: self.cur.pos,
            });
        }
        let name = self.parse_atom()?;
        let mut command = Command {
            name,
            args: Vec::new(),
            redirects: Redirects::default(),
        };

        loop {
            if self.cur_is(TokenKind::Space) {
                self.skip_spaces()?;
                continue;
            }
            match self.cur.kind {
                kind if is_atom_start(kind) => {
                    let arg = self.parse_atom()?;
                    // Empty bare/single-quoted words vanish; `""` survives
                    // as an empty double-quoted argument.
                    let drop = matches!(&arg, Expr::Raw(s) | Expr::SingleQuoted(s) if s.is_empty());
                    if !drop {
                        command.args.push(arg);
                    }
                }
                TokenKind::Redirect | TokenKind::Append => self.parse_redirect(&mut command)?,
                _ => break,
            }
        }
        Ok(command)
    }

    fn parse_redirect(&mut self, command: &mut Command) -> Result<(), ParseError> {
        debug_assert!(matches!(
            self.cur.kind,
            TokenKind::Redirect | TokenKind::Append
        ));
        if self.prev.kind != TokenKind::Space {
            return Err(ParseError::ExpectedSpaceBeforeRedirect { pos: self.cur.pos });
        }
        let to_stderr = self.cur.literal.starts_with('2');
        let mode = if self.cur_is(TokenKind::Append) {
            RedirectMode::Append
        } else {
            RedirectMode::Truncate
        };
        self.advance()?;

        if !self.cur_is(TokenKind::Space) {
            return Err(ParseError::UnexpectedToken {
                expected: "space after redirect",
                found: self.cur.to_string(),
                pos: self.cur.pos,
            });
        }
        self.skip_spaces()?;
        if !is_atom_start(self.cur.kind) {
            return Err(ParseError::ExpectedFilenameAfterRedirect {
                found: self.cur.to_string(),
                pos: self.cur.pos,
            });
        }
        let filename = self.parse_atom()?;

        let target = Target { filename, mode };
        if to_stderr {
            command.redirects.stderr.push(target);
        } else {
            command.redirects.stdout.push(target);
        }
        Ok(())
    }

    /// One word: a maximal run of adjacent text/escape/quote/variable
    /// segments.
    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        let mut parts: Vec<Expr> = Vec::new();
        let mut pending = String::new();
        let mut saw_plain = false;
        let mut saw_single = false;
        let mut saw_composite = false;

        loop {
            match self.cur.kind {
                TokenKind::Text => {
                    pending.push_str(&self.cur.literal);
                    saw_plain = true;
                    self.advance()?;
                }
                TokenKind::Escaped => {
                    pending.push_str(unescape(&self.cur.literal));
                    saw_plain = true;
                    self.advance()?;
                }
                TokenKind::SingleQuote => {
                    self.consume_single_quoted(&mut pending)?;
                    saw_single = true;
                }
                TokenKind::DoubleQuote => {
                    flush_pending(&mut pending, &mut parts);
                    let children = self.consume_double_quoted()?;
                    parts.push(Expr::DoubleQuoted(children));
                    saw_composite = true;
                }
                TokenKind::Variable => {
                    let name = variable_name(&self.cur.literal);
                    if name.is_empty() {
                        return Err(ParseError::EmptyVariable { pos: self.cur.pos });
                    }
                    flush_pending(&mut pending, &mut parts);
                    parts.push(Expr::Variable(name.to_string()));
                    saw_composite = true;
                    self.advance()?;
                }
                _ => break,
            }
        }
        flush_pending(&mut pending, &mut parts);

        if !saw_composite {
            // Pure literal run collapses to one flat expression.
            let literal = match parts.pop() {
                Some(Expr::Raw(s)) => s,
                None => String::new(),
                Some(other) => unreachable!("literal run produced {other:?}"),
            };
            return Ok(if saw_single && !saw_plain {
                Expr::SingleQuoted(literal)
            } else {
                Expr::Raw(literal)
            });
        }
        if parts.len() == 1 {
            return Ok(parts.into_iter().next().expect("exactly one part"));
        }
        // Mixed adjacency concatenates through the double-quote node.
        let mut children = Vec::new();
        for part in parts {
            match part {
                Expr::DoubleQuoted(inner) => children.extend(inner),
                other => children.push(other),
            }
        }
        Ok(Expr::DoubleQuoted(children))
    }

    fn consume_single_quoted(&mut self, pending: &mut String) -> Result<(), ParseError> {
        debug_assert!(self.cur_is(TokenKind::SingleQuote));
        self.advance()?;
        loop {
            match self.cur.kind {
                TokenKind::Text => {
                    pending.push_str(&self.cur.literal);
                    self.advance()?;
                }
                TokenKind::SingleQuote => {
                    self.advance()?;
                    return Ok(());
                }
                _ => {
                    return Err(ParseError::UnexpectedToken {
                        expected: "closing single quote",
                        found: self.cur.to_string(),
                        pos: self.cur.pos,
                    });
                }
            }
        }
    }

    fn consume_double_quoted(&mut self) -> Result<Vec<Expr>, ParseError> {
        debug_assert!(self.cur_is(TokenKind::DoubleQuote));
        self.advance()?;
        let mut children = Vec::new();
        let mut pending = String::new();
        loop {
            match self.cur.kind {
                TokenKind::Text => {
                    pending.push_str(&self.cur.literal);
                    self.advance()?;
                }
                TokenKind::Escaped => {
                    pending.push_str(unescape(&self.cur.literal));
                    self.advance()?;
                }
                TokenKind::Variable => {
                    let name = variable_name(&self.cur.literal);
                    if name.is_empty() {
                        return Err(ParseError::EmptyVariable { pos: self.cur.pos });
                    }
                    flush_pending(&mut pending, &mut children);
                    children.push(Expr::Variable(name.to_string()));
                    self.advance()?;
                }
                TokenKind::DoubleQuote => {
                    flush_pending(&mut pending, &mut children);
                    self.advance()?;
                    return Ok(children);
                }
                _ => {
                    return Err(ParseError::UnexpectedToken {
                        expected: "closing double quote",
                        found: self.cur.to_string(),
                        pos: self.cur.pos,
                    });
                }
            }
        }
    }
}

fn is_atom_start(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Text
            | TokenKind::Escaped
            | TokenKind::SingleQuote
            | TokenKind::DoubleQuote
            | TokenKind::Variable
    )
}

fn flush_pending(pending: &mut String, parts: &mut Vec<Expr>) {
    if !pending.is_empty() {
        parts.push(Expr::Raw(std::mem::take(pending)));
    }
}

/// `\x` keeps only `x`; the backslash is consumed, nothing is translated.
fn unescape(literal: &str) -> &str {
    literal.strip_prefix('\\').unwrap_or(literal)
}

/// Strip `$` and optional braces from a variable token literal.
fn variable_name(literal: &str) -> &str {
    let body = literal.strip_prefix('$').unwrap_or(literal);
    body.strip_prefix('{')
        .and_then(|b| b.strip_suffix('}'))
        .unwrap_or(body)
}
