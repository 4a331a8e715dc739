use crate::reader::Reader;

use diagnostics::ParseResult as Result;

use source::diagnostics::{ByteIndex, Diagnostic, Label, Span};

use syntax::symbol::Symbol;
use syntax::token::{token, Token, TokenKind};
use syntax::token::{Keyword, Lit, LitKind};

use std::collections::VecDeque;
use std::iter::Iterator;

trait IdentChar {
    fn is_id_char(&self) -> bool;
    fn is_id_start(&self) -> bool;
    fn is_id_continue(&self) -> bool;
}

impl IdentChar for char {
    fn is_id_char(&self) -> bool {
        self.is_id_start() || self.is_id_continue()
    }

    fn is_id_start(&self) -> bool {
        use ucd::Codepoint;
        match *self {
            ch if Codepoint::is_id_start(ch) => true,
            ch if Codepoint::is_id_start_other(ch) => true,
            '$' | '_' => true,
            _ => false,
        }
    }

    fn is_id_continue(&self) -> bool {
        use ucd::Codepoint;
        Codepoint::is_id_continue(*self) || Codepoint::is_id_continue_other(*self)
    }
}

/// Tokenizer for one expression. Spans are byte ranges relative to the
/// expression text; callers attach the markup position when reporting.
pub struct Lexer<'a> {
    reader: Reader<'a>,
    source: &'a str,
    lookahead: VecDeque<Token>,
}

macro_rules! symbol {
    ($self: ident, $start: ident, $end: ident) => {
        Symbol::intern(&$self.source[($start.to_usize())..($end.to_usize())])
    };
}

fn unexpected(message: &str, span: Span) -> Diagnostic {
    Diagnostic::error()
        .with_message(message)
        .with_labels(vec![Label::primary(span)])
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            reader: Reader::new(source),
            source,
            lookahead: VecDeque::with_capacity(2),
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    fn next_char(&mut self) -> Option<char> {
        self.reader.next()
    }

    fn peek_char(&mut self) -> Option<&char> {
        self.reader.peek()
    }

    fn start_span(&self) -> ByteIndex {
        self.reader.start()
    }

    fn end_span(&self, pos: ByteIndex) -> Span {
        self.reader.end(pos)
    }

    fn eat(&mut self, ch: char) {
        let next_ch = self.next_char();
        debug_assert_eq!(Some(ch), next_ch);
    }

    fn skip_while<F>(&mut self, pred: F)
    where
        F: Fn(char) -> bool,
    {
        while let Some(&ch) = self.peek_char() {
            if !pred(ch) {
                return;
            }
            self.eat(ch);
        }
    }

    fn skip_whitespace(&mut self) {
        self.skip_while(char::is_whitespace);
    }

    // Read a token containing a single character
    fn punc(&mut self, kind: TokenKind, token_char: char) -> Token {
        let span_start = self.start_span();
        self.eat(token_char);
        token(kind, self.end_span(span_start))
    }

    /// Read `first` followed by the longest run of `tails` that matches.
    /// Each entry is (following char, resulting kind), tried in order.
    fn punc_with(&mut self, first: char, single: TokenKind, tails: &[(char, TokenKind)]) -> Token {
        let span_start = self.start_span();
        self.eat(first);
        let mut kind = single;
        for (ch, next_kind) in tails {
            if self.peek_char() == Some(ch) {
                self.eat(*ch);
                kind = next_kind.clone();
            } else {
                break;
            }
        }
        token(kind, self.end_span(span_start))
    }

    /**
     * Tokenize a number literal. Integers and decimals are represented the
     * same way, and an exponent is allowed.
     */
    fn number(&mut self) -> Token {
        let mut seen_decimal = false;
        let span_start = self.start_span();
        let start = self.reader.offset();
        loop {
            match self.peek_char() {
                Some('.') if !seen_decimal => {
                    self.eat('.');
                    seen_decimal = true;
                }
                Some(&ch) if ch.is_ascii_digit() => self.eat(ch),
                Some(&ch) if ch == 'e' || ch == 'E' => {
                    self.eat(ch);
                    if let Some(&sign) = self.peek_char() {
                        if sign == '+' || sign == '-' {
                            self.eat(sign);
                        }
                    }
                    self.skip_while(|ch| ch.is_ascii_digit());
                    break;
                }
                _ => break,
            }
        }
        let end = self.reader.offset();
        let span = self.end_span(span_start);
        let literal = Lit {
            kind: LitKind::Number,
            symbol: symbol!(self, start, end),
        };
        token(TokenKind::Literal(literal), span)
    }

    fn eof(&self) -> Token {
        let span_start = self.start_span();
        token(TokenKind::EOF, self.end_span(span_start))
    }

    /**
     * Parses a single word as either an identifier, a literal word
     * (true, null...) or a reserved word.
     */
    fn ident(&mut self) -> Token {
        use TokenKind::{Ident, Literal, Reserved};
        let span_start = self.start_span();
        let start = self.reader.offset();
        self.skip_while(|ch| ch.is_id_char());
        let end = self.reader.offset();
        let span = self.end_span(span_start);
        let ident = &self.source[start.to_usize()..end.to_usize()];
        let literal = |kind| {
            Literal(Lit {
                kind,
                symbol: Symbol::intern(ident),
            })
        };
        let kind = match ident {
            "true" | "false" => literal(LitKind::Bool),
            "null" => literal(LitKind::Null),
            "undefined" => literal(LitKind::Undefined),
            "typeof" => Reserved(Keyword::Typeof),
            "in" => Reserved(Keyword::In),
            _ => Ident(Symbol::intern(ident)),
        };
        token(kind, span)
    }

    fn string(&mut self, quote: char) -> Result<Token> {
        let span_start = self.start_span();
        self.eat(quote);
        let mut value = String::new();
        loop {
            match self.next_char() {
                Some(ch) if ch == quote => break,
                Some('\\') => match self.next_char() {
                    Some('n') => value.push('\n'),
                    Some('r') => value.push('\r'),
                    Some('t') => value.push('\t'),
                    Some(ch) => value.push(ch),
                    None => {
                        return Err(unexpected(
                            "Unterminated string literal",
                            self.end_span(span_start),
                        ))
                    }
                },
                Some(ch) => value.push(ch),
                None => {
                    return Err(unexpected(
                        "Unterminated string literal",
                        self.end_span(span_start),
                    ))
                }
            }
        }
        let lit = Lit {
            kind: LitKind::Str,
            symbol: Symbol::intern(&value),
        };
        Ok(token(TokenKind::Literal(lit), self.end_span(span_start)))
    }

    fn pair(&mut self, ch: char, kind: TokenKind) -> Result<Token> {
        let span_start = self.start_span();
        self.eat(ch);
        if self.peek_char() == Some(&ch) {
            self.eat(ch);
            Ok(token(kind, self.end_span(span_start)))
        } else {
            Err(unexpected(
                &format!("Expected another '{}'", ch),
                self.end_span(span_start),
            ))
        }
    }

    fn pipe(&mut self) -> Token {
        let lo = self.start_span();
        self.eat('|');
        let kind = if self.peek_char() == Some(&'|') {
            self.eat('|');
            TokenKind::Or
        } else {
            TokenKind::BinOr
        };
        token(kind, self.end_span(lo))
    }

    fn plus_or_minus(&mut self, ch: char) -> Token {
        use TokenKind::{Minus, MinusEquals, MinusMinus, Plus, PlusEquals, PlusPlus};
        let lo = self.start_span();
        self.eat(ch);
        let (single, double, assign) = if ch == '+' {
            (Plus, PlusPlus, PlusEquals)
        } else {
            (Minus, MinusMinus, MinusEquals)
        };
        let kind = match self.peek_char() {
            Some(&next) if next == ch => {
                self.eat(next);
                double
            }
            Some('=') => {
                self.eat('=');
                assign
            }
            _ => single,
        };
        token(kind, self.end_span(lo))
    }

    fn scan_token(&mut self) -> Result<Token> {
        use TokenKind::*;
        self.skip_whitespace();
        let token = match self.peek_char() {
            Some(&ch) if ch.is_ascii_digit() => self.number(),
            Some(&ch) if ch.is_id_start() => self.ident(),
            Some(&quote) if quote == '"' || quote == '\'' => return self.string(quote),
            Some('=') => self.punc_with('=', Equals, &[('=', DblEquals), ('=', TplEquals)]),
            Some('!') => self.punc_with('!', Exclaim, &[('=', NotEquals), ('=', NotDblEquals)]),
            Some('<') => self.punc_with('<', LessThan, &[('=', LessThanEquals)]),
            Some('>') => self.punc_with('>', GreaterThan, &[('=', GreaterThanEquals)]),
            Some(&ch) if ch == '+' || ch == '-' => self.plus_or_minus(ch),
            Some('|') => self.pipe(),
            Some('&') => return self.pair('&', And),
            Some('?') => self.punc(Question, '?'),
            Some('(') => self.punc(LParen, '('),
            Some(')') => self.punc(RParen, ')'),
            Some('{') => self.punc(LCurlyBrace, '{'),
            Some('}') => self.punc(RCurlyBrace, '}'),
            Some('[') => self.punc(LBrace, '['),
            Some(']') => self.punc(RBrace, ']'),
            Some(':') => self.punc(Colon, ':'),
            Some(';') => self.punc(Semi, ';'),
            Some('.') => self.punc(Dot, '.'),
            Some('%') => self.punc(Mod, '%'),
            Some(',') => self.punc(Comma, ','),
            Some('*') => self.punc(Mul, '*'),
            Some('/') => self.punc(Div, '/'),
            Some(&ch) => {
                let span_start = self.start_span();
                self.eat(ch);
                return Err(unexpected(
                    &format!("Unexpected character '{}'", ch),
                    self.end_span(span_start),
                ));
            }
            None => self.eof(),
        };
        Ok(token)
    }

    pub fn next_token(&mut self) -> Result<Token> {
        // Read from the lookahead if its populated.
        if let Some(token) = self.lookahead.pop_front() {
            return Ok(token);
        }
        self.scan_token()
    }

    pub fn peek_token(&mut self) -> Result<&Token> {
        if self.lookahead.is_empty() {
            let token = self.scan_token()?;
            self.lookahead.push_back(token);
        }
        match self.lookahead.front() {
            Some(token) => Ok(token),
            None => Err(unexpected("Lexer lookahead is empty", self.eof().span)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source);
        let mut kinds = vec![];
        loop {
            let token = lexer.next_token().unwrap();
            if token.kind == TokenKind::EOF {
                return kinds;
            }
            kinds.push(token.kind);
        }
    }

    #[test]
    fn longest_operator_wins() {
        use TokenKind::*;
        assert_eq!(
            kinds("a === b !== c <= d ++ -="),
            vec![
                Ident(Symbol::intern("a")),
                TplEquals,
                Ident(Symbol::intern("b")),
                NotDblEquals,
                Ident(Symbol::intern("c")),
                LessThanEquals,
                Ident(Symbol::intern("d")),
                PlusPlus,
                MinusEquals,
            ]
        );
    }

    #[test]
    fn literal_words() {
        let lexed = kinds("true null undefined typeof in");
        assert!(matches!(&lexed[0], TokenKind::Literal(Lit { kind: LitKind::Bool, .. })));
        assert!(matches!(&lexed[1], TokenKind::Literal(Lit { kind: LitKind::Null, .. })));
        assert!(matches!(&lexed[2], TokenKind::Literal(Lit { kind: LitKind::Undefined, .. })));
        assert_eq!(lexed[3], TokenKind::Reserved(Keyword::Typeof));
        assert_eq!(lexed[4], TokenKind::Reserved(Keyword::In));
    }

    #[test]
    fn strings_are_unescaped() {
        let lexed = kinds(r#"'it\'s' "a\nb""#);
        assert_eq!(
            lexed,
            vec![
                TokenKind::Literal(Lit {
                    kind: LitKind::Str,
                    symbol: Symbol::intern("it's"),
                }),
                TokenKind::Literal(Lit {
                    kind: LitKind::Str,
                    symbol: Symbol::intern("a\nb"),
                }),
            ]
        );
    }

    #[test]
    fn numbers_with_decimals_and_exponents() {
        let lexed = kinds("1.5 2e10 3");
        let numbers: Vec<String> = lexed
            .iter()
            .map(|kind| match kind {
                TokenKind::Literal(lit) => lit.symbol.to_string(),
                _ => String::new(),
            })
            .collect();
        assert_eq!(numbers, vec!["1.5", "2e10", "3"]);
    }

    #[test]
    fn reports_unterminated_strings() {
        let mut lexer = Lexer::new("'abc");
        let error = lexer.next_token().unwrap_err();
        assert!(error.message.contains("Unterminated"));
    }

    #[test]
    fn peeking_does_not_consume() {
        let mut lexer = Lexer::new("a b");
        let peeked = lexer.peek_token().unwrap().kind.clone();
        assert_eq!(lexer.next_token().unwrap().kind, peeked);
        assert_eq!(
            lexer.next_token().unwrap().kind,
            TokenKind::Ident(Symbol::intern("b"))
        );
    }
}
