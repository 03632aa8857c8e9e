//! State-function lexer.
//!
//! Each state examines the head of the remaining input and either emits
//! tokens or hands off to the next state. The machine runs one state per
//! `next_token` drain, mirrors byte offsets into every token, and halts on
//! the first malformed construct by emitting a single `Error` token.

use std::collections::VecDeque;

use crate::token::{Token, TokenKind};

const SPACE_CHARS: &str = " \t\r\n";
const QUOTED_ESCAPE_CHARS: &str = "\"\\$";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Text,
    SingleQuotes,
    InsideDoubleQuotes,
    RedirectOrAppend,
}

pub struct Lexer {
    input: String,
    state: Option<LexState>,
    tokens: VecDeque<Token>,

    at_eof: bool,
    start: usize,
    pos: usize,
    width: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
            state: Some(LexState::Text),
            tokens: VecDeque::new(),
            at_eof: false,
            start: 0,
            pos: 0,
            width: 0,
        }
    }

    /// Produce the next token, running states until one is available.
    pub fn next_token(&mut self) -> Token {
        loop {
            if let Some(token) = self.tokens.pop_front() {
                return token;
            }
            let Some(state) = self.state else {
                // Halted (after an error): behave as exhausted input.
                return Token::new(TokenKind::Eof, "", self.input.len());
            };
            self.state = self.run(state);
        }
    }

    fn run(&mut self, state: LexState) -> Option<LexState> {
        match state {
            LexState::Text => self.lex_text(),
            LexState::SingleQuotes => self.lex_single_quotes(),
            LexState::InsideDoubleQuotes => self.lex_inside_double_quotes(),
            LexState::RedirectOrAppend => self.lex_redirect_or_append(),
        }
    }

    // ---------------------------------------------------------------------
    // Primitives
    // ---------------------------------------------------------------------

    fn next(&mut self) -> Option<char> {
        let rest = &self.input[self.pos..];
        let Some(c) = rest.chars().next() else {
            self.at_eof = true;
            return None;
        };
        self.width = c.len_utf8();
        self.pos += self.width;
        Some(c)
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn backup(&mut self) {
        if !self.at_eof && self.pos > 0 {
            self.pos -= self.width;
        }
    }

    fn accept(&mut self, valid: &str) -> bool {
        match self.next() {
            Some(c) if valid.contains(c) => true,
            Some(_) => {
                self.backup();
                false
            }
            None => false,
        }
    }

    fn accept_run(&mut self, valid: &str) {
        while self.accept(valid) {}
    }

    fn pending(&self) -> &str {
        &self.input[self.start..self.pos]
    }

    fn emit(&mut self, kind: TokenKind) {
        debug_assert!(self.pos >= self.start);
        let token = Token::new(kind, &self.input[self.start..self.pos], self.start);
        self.tokens.push_back(token);
        self.start = self.pos;
    }

    fn emit_text_if_pending(&mut self) {
        if self.pos > self.start {
            self.emit(TokenKind::Text);
        }
    }

    fn emit_eof(&mut self) {
        debug_assert_eq!(self.start, self.pos);
        self.tokens
            .push_back(Token::new(TokenKind::Eof, "", self.input.len()));
    }

    /// Emit an `Error` token and halt the machine.
    fn error(&mut self, message: impl Into<String>) -> Option<LexState> {
        self.tokens
            .push_back(Token::new(TokenKind::Error, message.into(), self.pos));
        None
    }

    // ---------------------------------------------------------------------
    // States
    // ---------------------------------------------------------------------

    fn lex_text(&mut self) -> Option<LexState> {
        loop {
            let Some(c) = self.peek() else {
                self.emit_text_if_pending();
                self.emit_eof();
                return None;
            };
            match c {
                c if is_space(c) => {
                    self.emit_text_if_pending();
                    self.accept_run(SPACE_CHARS);
                    self.emit(TokenKind::Space);
                    return Some(LexState::Text);
                }
                '\'' => {
                    self.emit_text_if_pending();
                    return Some(LexState::SingleQuotes);
                }
                '"' => {
                    self.emit_text_if_pending();
                    self.next();
                    self.emit(TokenKind::DoubleQuote);
                    return Some(LexState::InsideDoubleQuotes);
                }
                '\\' => {
                    self.emit_text_if_pending();
                    self.lex_escaped();
                    return Some(LexState::Text);
                }
                '|' => {
                    self.emit_text_if_pending();
                    self.next();
                    self.emit(TokenKind::Pipe);
                    return Some(LexState::Text);
                }
                '&' => {
                    self.emit_text_if_pending();
                    self.next();
                    self.emit(TokenKind::Ampersand);
                    return Some(LexState::Text);
                }
                ';' => {
                    self.emit_text_if_pending();
                    self.next();
                    self.emit(TokenKind::Semicolon);
                    return Some(LexState::Text);
                }
                '$' => {
                    self.emit_text_if_pending();
                    if self.lex_variable().is_none() {
                        return None;
                    }
                    return Some(LexState::Text);
                }
                '>' => return self.start_redirect(),
                _ => {
                    self.next();
                }
            }
        }
    }

    /// `\` plus the following character, emitted verbatim.
    fn lex_escaped(&mut self) {
        debug_assert_eq!(self.start, self.pos);
        let accepted = self.accept("\\");
        debug_assert!(accepted);
        self.next();
        self.emit(TokenKind::Escaped);
    }

    /// `$name` or `${name}` with alphanumeric/underscore names. Returns
    /// `None` when the machine halted on a malformed variable.
    fn lex_variable(&mut self) -> Option<()> {
        let accepted = self.accept("$");
        debug_assert!(accepted);
        let has_brace = self.accept("{");

        loop {
            match self.next() {
                Some(c) if is_alphanumeric(c) => continue,
                Some('}') => {
                    if !has_brace {
                        self.error("unexpected closing brace in variable");
                        return None;
                    }
                    self.emit(TokenKind::Variable);
                    return Some(());
                }
                Some(_) => {
                    self.backup();
                    if has_brace {
                        self.error("unclosed variable brace");
                        return None;
                    }
                    self.emit(TokenKind::Variable);
                    return Some(());
                }
                None => {
                    if has_brace {
                        self.error("unclosed variable brace");
                        return None;
                    }
                    self.emit(TokenKind::Variable);
                    return Some(());
                }
            }
        }
    }

    /// Entry guard for `>`/`>>`: the optional `1`/`2` prefix must sit in the
    /// pending text, and the character before the token must be whitespace.
    fn start_redirect(&mut self) -> Option<LexState> {
        let has_digit = match self.pending() {
            "" => false,
            "1" | "2" => true,
            _ => {
                return self.error(format!(
                    "expected space before a redirect at byte {}",
                    self.pos
                ));
            }
        };
        let preceding = self.input[..self.start].chars().next_back();
        match preceding {
            Some(c) if is_space(c) => {}
            _ => {
                return self.error(format!(
                    "expected space before a redirect at byte {}",
                    self.pos
                ));
            }
        }
        if has_digit {
            // Rewind so the redirect state owns the digit.
            self.pos = self.start;
        }
        Some(LexState::RedirectOrAppend)
    }

    fn lex_redirect_or_append(&mut self) -> Option<LexState> {
        self.accept("12");
        let accepted = self.accept(">");
        debug_assert!(accepted);
        if self.accept(">") {
            self.emit(TokenKind::Append);
        } else {
            self.emit(TokenKind::Redirect);
        }
        Some(LexState::Text)
    }

    fn lex_single_quotes(&mut self) -> Option<LexState> {
        let accepted = self.accept("'");
        debug_assert!(accepted);
        self.emit(TokenKind::SingleQuote);

        loop {
            match self.peek() {
                Some('\'') => {
                    self.emit_text_if_pending();
                    self.next();
                    self.emit(TokenKind::SingleQuote);
                    return Some(LexState::Text);
                }
                None => return self.error("unclosed single quotes"),
                Some(_) => {
                    self.next();
                }
            }
        }
    }

    fn lex_inside_double_quotes(&mut self) -> Option<LexState> {
        loop {
            match self.peek() {
                Some('"') => {
                    self.emit_text_if_pending();
                    self.next();
                    self.emit(TokenKind::DoubleQuote);
                    return Some(LexState::Text);
                }
                Some('$') => {
                    self.emit_text_if_pending();
                    self.lex_variable()?;
                }
                Some('\\') => {
                    self.next();
                    match self.peek() {
                        Some(c) if QUOTED_ESCAPE_CHARS.contains(c) => {
                            // Re-emit text up to the backslash, then the pair.
                            self.backup();
                            self.emit_text_if_pending();
                            self.next();
                            self.next();
                            self.emit(TokenKind::Escaped);
                        }
                        // Any other backslash is literal text.
                        _ => {}
                    }
                }
                None => return self.error("unclosed double quotes"),
                Some(_) => {
                    self.next();
                }
            }
        }
    }
}

fn is_space(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\r' || c == '\n'
}

fn is_alphanumeric(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}
