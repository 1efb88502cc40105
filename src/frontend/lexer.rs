//! Lexer for Swiftlite.
//!
//! Converts source text into a stream of line-tagged tokens plus a list of
//! lexical diagnostics. The lexer never aborts: a character it cannot match
//! is reported and skipped, an unterminated string is reported and scanning
//! resumes on the following line.

use crate::frontend::token::{Token, TokenKind};
use crate::utils::Diagnostic;

/// The lexer state
pub struct Lexer {
    /// Source code as chars
    source: Vec<char>,
    /// Current position in source
    pos: usize,
    /// Start position of current token
    start: usize,
    /// Current line, starting at 1
    line: u32,
    /// Lexical diagnostics collected so far
    diagnostics: Vec<Diagnostic>,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            start: 0,
            line: 1,
            diagnostics: Vec::new(),
        }
    }

    /// Get the current character without advancing
    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    /// Get the next character without advancing
    fn peek_next(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    /// Advance to the next character
    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        c
    }

    /// Check if we've reached the end of input
    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.line)
    }

    /// Skip whitespace and comments, counting newlines.
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' => {
                    self.advance();
                }
                '\n' => {
                    self.line += 1;
                    self.advance();
                }
                // Line comment
                '/' if self.peek_next() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                // Block comment
                '/' if self.peek_next() == Some('*') => {
                    let open_line = self.line;
                    self.advance(); // skip /
                    self.advance(); // skip *
                    let mut closed = false;
                    while !self.is_at_end() {
                        match (self.peek(), self.peek_next()) {
                            (Some('*'), Some('/')) => {
                                self.advance();
                                self.advance();
                                closed = true;
                                break;
                            }
                            (Some('\n'), _) => {
                                self.line += 1;
                                self.advance();
                            }
                            _ => {
                                self.advance();
                            }
                        }
                    }
                    if !closed {
                        self.diagnostics.push(Diagnostic::lexical(
                            open_line,
                            "unterminated block comment",
                        ));
                    }
                }
                _ => break,
            }
        }
    }

    /// Read an identifier or reserved word
    fn read_identifier(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let text: String = self.source[self.start..self.pos].iter().collect();

        let kind =
            TokenKind::keyword_from_str(&text).unwrap_or_else(|| TokenKind::Ident(text));

        self.make_token(kind)
    }

    /// Read a number literal (integer or float).
    ///
    /// A float needs a decimal point with digits on both sides; only then may
    /// a scientific-notation suffix follow. `1...5` keeps the dots for the
    /// range operator.
    fn read_number(&mut self) -> Token {
        let mut is_float = false;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }

        if self.peek() == Some('.') && self.peek_next().map_or(false, |c| c.is_ascii_digit()) {
            is_float = true;
            self.advance(); // consume '.'

            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        // Exponent suffix, only on a literal that already has a decimal point
        if is_float && matches!(self.peek(), Some('e') | Some('E')) {
            let mut probe = self.pos + 1;
            if matches!(self.source.get(probe), Some('+') | Some('-')) {
                probe += 1;
            }
            if self.source.get(probe).map_or(false, |c| c.is_ascii_digit()) {
                self.pos = probe;
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }

        let text: String = self.source[self.start..self.pos].iter().collect();

        if is_float {
            let value = text.parse().unwrap_or_else(|_| {
                self.diagnostics.push(Diagnostic::lexical(
                    self.line,
                    format!("floating literal '{}' out of range", text),
                ));
                0.0
            });
            self.make_token(TokenKind::FloatLit(value))
        } else {
            let value = text.parse().unwrap_or_else(|_| {
                self.diagnostics.push(Diagnostic::lexical(
                    self.line,
                    format!("integer literal '{}' out of range", text),
                ));
                0
            });
            self.make_token(TokenKind::IntLit(value))
        }
    }

    /// Read a string literal, decoding escape sequences.
    ///
    /// Returns None on an unterminated string: one diagnostic is recorded and
    /// the newline is left in place so scanning resumes on the next line.
    fn read_string(&mut self) -> Option<Token> {
        let open_line = self.line;
        self.advance(); // consume opening quote

        let mut value = String::new();

        loop {
            match self.peek() {
                Some('"') => {
                    self.advance(); // consume closing quote
                    return Some(self.make_token(TokenKind::StringLit(value)));
                }
                Some('\\') => {
                    self.advance();
                    match self.advance() {
                        Some('n') => value.push('\n'),
                        Some('r') => value.push('\r'),
                        Some('t') => value.push('\t'),
                        Some('\\') => value.push('\\'),
                        Some('"') => value.push('"'),
                        Some('0') => value.push('\0'),
                        // Escaped line break: the literal continues on the
                        // next source line
                        Some('\n') => {
                            self.line += 1;
                            value.push('\n');
                        }
                        Some(c) => value.push(c),
                        None => break,
                    }
                }
                Some('\n') | None => break,
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }

        self.diagnostics.push(Diagnostic::lexical(
            open_line,
            "unterminated string literal",
        ));
        None
    }

    /// Get the next token. Returns None when the scanner consumed input
    /// without producing a token (bad character, unterminated string).
    fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace();
        self.start = self.pos;

        if self.is_at_end() {
            return Some(Token::eof(self.line));
        }

        let c = self.advance().unwrap_or('\0');

        // Identifiers and reserved words
        if c.is_ascii_alphabetic() || c == '_' {
            self.pos -= 1; // back up
            return Some(self.read_identifier());
        }

        // Numbers
        if c.is_ascii_digit() {
            self.pos -= 1; // back up
            return Some(self.read_number());
        }

        // String literals
        if c == '"' {
            self.pos -= 1; // back up
            return self.read_string();
        }

        // Operators and punctuation, longest match first
        let kind = match c {
            '+' => TokenKind::Plus,
            '-' => {
                if self.peek() == Some('>') {
                    self.advance();
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                }
            }
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::EqEq
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Ne
                } else {
                    TokenKind::Not
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '&' => {
                if self.peek() == Some('&') {
                    self.advance();
                    TokenKind::AndAnd
                } else {
                    self.diagnostics.push(Diagnostic::lexical(
                        self.line,
                        "unrecognized character '&'",
                    ));
                    return None;
                }
            }
            '|' => {
                if self.peek() == Some('|') {
                    self.advance();
                    TokenKind::OrOr
                } else {
                    self.diagnostics.push(Diagnostic::lexical(
                        self.line,
                        "unrecognized character '|'",
                    ));
                    return None;
                }
            }
            '.' => {
                if self.peek() == Some('.') && self.peek_next() == Some('.') {
                    self.advance();
                    self.advance();
                    TokenKind::Ellipsis
                } else {
                    TokenKind::Dot
                }
            }
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            _ => {
                self.diagnostics.push(Diagnostic::lexical(
                    self.line,
                    format!("unrecognized character '{}'", c),
                ));
                return None;
            }
        };

        Some(self.make_token(kind))
    }

    /// Tokenize the entire source, returning the token stream and all
    /// lexical diagnostics.
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        loop {
            let Some(token) = self.next_token() else {
                continue;
            };
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        log::debug!(
            "tokenized {} tokens, {} lexical diagnostics",
            tokens.len(),
            self.diagnostics.len()
        );
        (tokens, self.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> (Vec<Token>, Vec<Diagnostic>) {
        Lexer::new(source).tokenize()
    }

    #[test]
    fn test_simple_tokens() {
        let (tokens, diags) = lex("var x = 10;");
        assert!(diags.is_empty());
        assert!(matches!(tokens[0].kind, TokenKind::Var));
        assert!(matches!(tokens[1].kind, TokenKind::Ident(ref s) if s == "x"));
        assert!(matches!(tokens[2].kind, TokenKind::Assign));
        assert!(matches!(tokens[3].kind, TokenKind::IntLit(10)));
        assert!(matches!(tokens[4].kind, TokenKind::Semicolon));
        assert!(matches!(tokens[5].kind, TokenKind::Eof));
    }

    #[test]
    fn test_reserved_words() {
        let (tokens, _) = lex("let func class if else while for in return true false");
        assert!(matches!(tokens[0].kind, TokenKind::Let));
        assert!(matches!(tokens[1].kind, TokenKind::Func));
        assert!(matches!(tokens[2].kind, TokenKind::Class));
        assert!(matches!(tokens[3].kind, TokenKind::If));
        assert!(matches!(tokens[4].kind, TokenKind::Else));
        assert!(matches!(tokens[5].kind, TokenKind::While));
        assert!(matches!(tokens[6].kind, TokenKind::For));
        assert!(matches!(tokens[7].kind, TokenKind::In));
        assert!(matches!(tokens[8].kind, TokenKind::Return));
        assert!(matches!(tokens[9].kind, TokenKind::BoolLit(true)));
        assert!(matches!(tokens[10].kind, TokenKind::BoolLit(false)));
    }

    #[test]
    fn test_numbers() {
        let (tokens, diags) = lex("42 3.14 2.5e3 1.0E-2");
        assert!(diags.is_empty());
        assert!(matches!(tokens[0].kind, TokenKind::IntLit(42)));
        assert!(matches!(tokens[1].kind, TokenKind::FloatLit(f) if (f - 3.14).abs() < 1e-9));
        assert!(matches!(tokens[2].kind, TokenKind::FloatLit(f) if (f - 2500.0).abs() < 1e-9));
        assert!(matches!(tokens[3].kind, TokenKind::FloatLit(f) if (f - 0.01).abs() < 1e-9));
    }

    #[test]
    fn test_exponent_requires_decimal_point() {
        // "1e5" is an integer followed by an identifier, not a float
        let (tokens, _) = lex("1e5");
        assert!(matches!(tokens[0].kind, TokenKind::IntLit(1)));
        assert!(matches!(tokens[1].kind, TokenKind::Ident(ref s) if s == "e5"));
    }

    #[test]
    fn test_range_not_decimal() {
        let (tokens, diags) = lex("1...5");
        assert!(diags.is_empty());
        assert!(matches!(tokens[0].kind, TokenKind::IntLit(1)));
        assert!(matches!(tokens[1].kind, TokenKind::Ellipsis));
        assert!(matches!(tokens[2].kind, TokenKind::IntLit(5)));
    }

    #[test]
    fn test_integer_literal_out_of_range() {
        // i64::MAX is 9223372036854775807
        let (tokens, diags) = lex("var n = 99999999999999999999;");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("out of range"));
        // A placeholder token keeps the stream parseable
        assert!(tokens.iter().any(|t| t.kind == TokenKind::IntLit(0)));
    }

    #[test]
    fn test_escaped_newline_keeps_line_count() {
        let (tokens, diags) = lex("var s = \"a\\\nb\";\nvar x = 1;");
        assert!(diags.is_empty());
        assert!(tokens
            .iter()
            .any(|t| t.kind == TokenKind::StringLit("a\nb".to_string())));
        // The second declaration starts on line 3
        assert!(tokens
            .iter()
            .any(|t| t.kind == TokenKind::Var && t.line == 3));
    }

    #[test]
    fn test_string_escapes() {
        let (tokens, diags) = lex(r#""hello\nworld""#);
        assert!(diags.is_empty());
        assert!(matches!(tokens[0].kind, TokenKind::StringLit(ref s) if s == "hello\nworld"));
    }

    #[test]
    fn test_unterminated_string_resumes_next_line() {
        let (tokens, diags) = lex("var s = \"oops;\nvar x = 1;");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].line, 1);
        assert!(diags[0].message.contains("unterminated string"));
        // Scanning resumed: the second declaration is tokenized on line 2
        let var_on_line2 = tokens
            .iter()
            .any(|t| t.kind == TokenKind::Var && t.line == 2);
        assert!(var_on_line2);
    }

    #[test]
    fn test_unrecognized_character_skipped() {
        let (tokens, diags) = lex("var x = 1 @ 2;");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains('@'));
        // Both integer literals survive
        assert!(tokens.iter().any(|t| t.kind == TokenKind::IntLit(1)));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::IntLit(2)));
    }

    #[test]
    fn test_comments_and_line_numbers() {
        let (tokens, diags) = lex("// header\n/* multi\nline */ var x = 1;");
        assert!(diags.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::Var);
        assert_eq!(tokens[0].line, 3);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let (_, diags) = lex("var x = 1; /* no end");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("block comment"));
    }

    #[test]
    fn test_lone_ampersand() {
        let (_, diags) = lex("a & b");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains('&'));
    }

    #[test]
    fn test_tokenize_is_idempotent() {
        let source = "var x: Int = 5;\nwhile x > 0 { x = x - 1; }";
        let (first, _) = lex(source);
        let (second, _) = lex(source);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_input() {
        let (tokens, diags) = lex("");
        assert!(diags.is_empty());
        assert_eq!(tokens.len(), 1);
        assert!(matches!(tokens[0].kind, TokenKind::Eof));
    }
}
