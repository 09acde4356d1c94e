use std::str::Chars;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Literals
    Ident,
    Number,

    // Operators
    Plus,
    Minus,
    Colon,
    Le,
    Ge,
    Eq,

    // Special
    Newline,
    Comment,
    Eof,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, text: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            text: text.into(),
        }
    }

    /// Case-insensitive keyword match for identifiers
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Ident && self.text.eq_ignore_ascii_case(word)
    }
}

/// Tokenizer for CPLEX LP text
pub struct Lexer<'a> {
    source: &'a str,
    chars: Chars<'a>,
    pos: usize,
    current: Option<char>,
}

pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

pub(crate) fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '[' | ']' | '(' | ')' | ',')
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut chars = source.chars();
        let current = chars.next();
        Self {
            source,
            chars,
            pos: 0,
            current,
        }
    }

    pub fn tokenize(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.current;
        self.current = self.chars.next();
        if let Some(c) = c {
            self.pos += c.len_utf8();
        }
        c
    }

    fn peek(&self) -> Option<char> {
        self.current
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.clone().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c == ' ' || c == '\t' || c == '\r' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_comment(&mut self) -> Token {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
        Token::new(
            TokenKind::Comment,
            Span::new(start, self.pos),
            &self.source[start..self.pos],
        )
    }

    fn read_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn read_number(&mut self) -> Token {
        let start = self.pos;

        self.read_digits();
        if self.peek() == Some('.') {
            self.advance();
            self.read_digits();
        }

        // Exponent only when digits follow, so `2e` lexes as `2` then `e`
        if matches!(self.peek(), Some('e' | 'E')) {
            let mut ahead = self.chars.clone();
            let has_digits = match ahead.next() {
                Some(c) if c.is_ascii_digit() => true,
                Some('+' | '-') => ahead.next().is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            };
            if has_digits {
                self.advance(); // e
                if matches!(self.peek(), Some('+' | '-')) {
                    self.advance();
                }
                self.read_digits();
            }
        }

        Token::new(
            TokenKind::Number,
            Span::new(start, self.pos),
            &self.source[start..self.pos],
        )
    }

    fn read_ident(&mut self) -> Token {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_continue) {
            self.advance();
        }
        Token::new(
            TokenKind::Ident,
            Span::new(start, self.pos),
            &self.source[start..self.pos],
        )
    }

    /// `<`, `<=`, `=<`, `>`, `>=`, `=>`, `=`
    fn read_relation(&mut self) -> Token {
        let start = self.pos;
        let first = self.advance();
        let second = self.peek();
        let kind = match (first, second) {
            (Some('<'), Some('=')) | (Some('='), Some('<')) => {
                self.advance();
                TokenKind::Le
            }
            (Some('>'), Some('=')) | (Some('='), Some('>')) => {
                self.advance();
                TokenKind::Ge
            }
            (Some('<'), _) => TokenKind::Le,
            (Some('>'), _) => TokenKind::Ge,
            _ => TokenKind::Eq,
        };
        Token::new(kind, Span::new(start, self.pos), &self.source[start..self.pos])
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.pos;

        let Some(c) = self.peek() else {
            return Token::new(TokenKind::Eof, Span::new(start, start), "");
        };

        match c {
            '\n' => {
                self.advance();
                Token::new(TokenKind::Newline, Span::new(start, self.pos), "\n")
            }
            '\\' => self.read_comment(),
            '+' => {
                self.advance();
                Token::new(TokenKind::Plus, Span::new(start, self.pos), "+")
            }
            '-' => {
                self.advance();
                Token::new(TokenKind::Minus, Span::new(start, self.pos), "-")
            }
            ':' => {
                self.advance();
                Token::new(TokenKind::Colon, Span::new(start, self.pos), ":")
            }
            '<' | '>' | '=' => self.read_relation(),
            '.' if self.peek_next().is_some_and(|n| n.is_ascii_digit()) => self.read_number(),
            c if c.is_ascii_digit() => self.read_number(),
            c if is_ident_start(c) => self.read_ident(),
            _ => {
                self.advance();
                Token::new(
                    TokenKind::Error,
                    Span::new(start, self.pos),
                    &self.source[start..self.pos],
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source).iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_numbers() {
        let tokens = Lexer::tokenize("100 8.5 .25 1e3 2.5E-2 2e");
        let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["100", "8.5", ".25", "1e3", "2.5E-2", "2", "e", ""]);
    }

    #[test]
    fn test_relations() {
        assert_eq!(
            kinds("<= =< < >= => > ="),
            vec![
                TokenKind::Le,
                TokenKind::Le,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::Ge,
                TokenKind::Ge,
                TokenKind::Eq,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_identifiers_with_indices() {
        let tokens = Lexer::tokenize("x[1,2] s.t. c_u_c1_");
        let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["x[1,2]", "s.t.", "c_u_c1_", ""]);
        assert!(tokens[1].is_word("S.T."));
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            kinds("\\ header\nc1: x"),
            vec![
                TokenKind::Comment,
                TokenKind::Newline,
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_constraint_line() {
        assert_eq!(
            kinds("c1: 3 x + 2 y - z <= 10"),
            vec![
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::Number,
                TokenKind::Ident,
                TokenKind::Plus,
                TokenKind::Number,
                TokenKind::Ident,
                TokenKind::Minus,
                TokenKind::Ident,
                TokenKind::Le,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unknown_character() {
        let tokens = Lexer::tokenize("x * y");
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert_eq!(tokens[1].span, Span::new(2, 3));
    }
}
