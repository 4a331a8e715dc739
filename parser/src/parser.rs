// renaming this Tokenizer for now because I'm tired of the word Lexer...
use lexer::Lexer as Tokenizer;
use syntax::ast;
use syntax::precedence::Precedence;
use syntax::token::{self, Keyword, LitKind, Token, TokenKind};

use diagnostics::ParseResult as Result;

use source::diagnostics::{Diagnostic, Label, Span};

use log::debug;

/// Recursive-descent / Pratt parser for the expression language found in
/// mustaches, attribute values and directive arguments.
pub struct Parser<'s> {
    /// The tokenizer/lexer for this Parser instance
    tokenizer: Tokenizer<'s>,
    /// The span of the current token
    span: Span,
}

trait DiagnosticReporting {
    fn fatal(&self, message: &str, label: &str, span: Span) -> Diagnostic;
}

impl DiagnosticReporting for Parser<'_> {
    fn fatal(&self, message: &str, label_message: &str, span: Span) -> Diagnostic {
        let label = Label::primary(span).with_message(label_message);
        Diagnostic::error()
            .with_message(message)
            .with_labels(vec![label])
    }
}

/// Header of a `ws:for` directive.
#[derive(Debug, Clone, PartialEq)]
pub enum ForHeader {
    /// `init; test; update`
    Loop {
        init: Option<ast::Expr>,
        test: Option<ast::Expr>,
        update: Option<ast::Expr>,
    },
    /// `key, value in collection` or `value in collection`
    Each {
        key: Option<ast::Ident>,
        value: ast::Ident,
        collection: ast::Expr,
    },
}

impl<'s> Parser<'s> {
    pub fn new(source: &'s str) -> Parser<'s> {
        debug!("Parser::new {:?}", source);
        let tokenizer = Tokenizer::new(source);
        // Start with a dummy span
        let span = Span::new(0, 0);
        Parser { tokenizer, span }
    }

    /// Returns the next token from the tokenizer.
    fn next_token(&mut self) -> Result<Token> {
        let token = self.tokenizer.next_token()?;
        self.span = token.span;
        Ok(token)
    }

    fn peek(&mut self) -> Result<&Token> {
        self.tokenizer.peek_token()
    }

    fn eat(&mut self, kind: &TokenKind) -> Result<bool> {
        if &self.peek()?.kind == kind {
            self.next_token()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token> {
        let prev_span = self.span;
        let token = self.next_token()?;
        if &token.kind == kind {
            Ok(token)
        } else {
            Err(Diagnostic::error()
                .with_message(format!("Expected '{}' but found '{}'", kind, token.kind))
                .with_labels(vec![
                    Label::primary(prev_span)
                        .with_message(format!("Expected {} after this token", kind)),
                    Label::secondary(self.span).with_message("But we found this instead"),
                ]))
        }
    }

    fn expect_eof(&mut self) -> Result<()> {
        let token = self.next_token()?;
        match token.kind {
            TokenKind::EOF => Ok(()),
            kind => Err(self.fatal(
                &format!("Unexpected token '{}'", kind),
                "Expected the end of the expression",
                token.span,
            )),
        }
    }

    fn peek_precedence(&mut self) -> Result<Precedence> {
        Ok(self.peek()?.precedence())
    }

    fn ident(&mut self) -> Result<ast::Ident> {
        let token = self.next_token()?;
        match token.kind {
            TokenKind::Ident(symbol) => Ok(ast::Ident {
                symbol,
                span: token.span,
            }),
            kind => Err(self.fatal(
                &format!("Unexpected token '{}'", kind),
                "Expected an identifier",
                token.span,
            )),
        }
    }

    /// Property names after `.` may be reserved or literal words.
    fn property_name(&mut self) -> Result<ast::Ident> {
        let token = self.next_token()?;
        let name = match &token.kind {
            TokenKind::Ident(symbol) => symbol.to_string(),
            TokenKind::Literal(token::Lit { kind, symbol }) if *kind != LitKind::Str && *kind != LitKind::Number => {
                symbol.to_string()
            }
            TokenKind::Reserved(keyword) => keyword.as_str().to_string(),
            kind => {
                return Err(self.fatal(
                    &format!("Unexpected token '{}'", kind),
                    "Expected a property name",
                    token.span,
                ))
            }
        };
        Ok(ast::Ident::new(&name, token.span))
    }

    /// Parse a complete expression. Trailing tokens are an error.
    pub fn parse_expression(&mut self) -> Result<ast::Expr> {
        let expr = self.expr(Precedence::NONE)?;
        self.expect_eof()?;
        Ok(expr)
    }

    pub fn parse_for_header(&mut self) -> Result<ForHeader> {
        if self.tokenizer.source().contains(';') {
            let init = self.optional_expr(&TokenKind::Semi)?;
            self.expect(&TokenKind::Semi)?;
            let test = self.optional_expr(&TokenKind::Semi)?;
            self.expect(&TokenKind::Semi)?;
            let update = self.optional_expr(&TokenKind::EOF)?;
            self.expect_eof()?;
            return Ok(ForHeader::Loop { init, test, update });
        }
        let first = self.ident()?;
        let (key, value) = if self.eat(&TokenKind::Comma)? {
            (Some(first), self.ident()?)
        } else {
            (None, first)
        };
        self.expect(&TokenKind::Reserved(Keyword::In))?;
        let collection = self.expr(Precedence::NONE)?;
        self.expect_eof()?;
        Ok(ForHeader::Each {
            key,
            value,
            collection,
        })
    }

    fn optional_expr(&mut self, terminator: &TokenKind) -> Result<Option<ast::Expr>> {
        if &self.peek()?.kind == terminator {
            Ok(None)
        } else {
            self.expr(Precedence::NONE).map(Some)
        }
    }

    pub(crate) fn expr(&mut self, precedence: Precedence) -> Result<ast::Expr> {
        let mut expr = self.prefix_expr()?;
        while precedence < self.peek_precedence()? {
            expr = self.infix_expr(expr)?;
        }
        Ok(expr)
    }

    fn prefix_expr(&mut self) -> Result<ast::Expr> {
        let token = self.peek()?.clone();
        match token.kind {
            // Literal values such as numbers, strings, booleans
            TokenKind::Literal(_) => {
                let lit = self.parse_lit()?;
                Ok(ast::expr(ast::ExprKind::Lit(lit), self.span))
            }
            // Array literals
            TokenKind::LBrace => {
                self.expect(&TokenKind::LBrace)?;
                let lo = self.span;
                let exprs = self.expr_list(&TokenKind::RBrace)?;
                let span = lo.merge(self.span);
                Ok(ast::expr(ast::ExprKind::Array(exprs), span))
            }
            TokenKind::LCurlyBrace => self.object_expr(),
            // Identifier
            TokenKind::Ident(_) => {
                let ident = self.ident()?;
                let span = ident.span;
                Ok(ast::expr(ast::ExprKind::Ident(ident), span))
            }
            // Unary expressions
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Exclaim
            | TokenKind::Reserved(Keyword::Typeof) => {
                let token = self.next_token()?;
                let lo = self.span;
                let op = token.to_un_op().ok_or_else(|| {
                    self.fatal("Unexpected token", "Expected an unary operator", lo)
                })?;
                let expr = self.expr(Precedence::PREFIX)?;
                let span = lo.merge(self.span);
                Ok(ast::expr(ast::ExprKind::Unary(op, Box::new(expr)), span))
            }
            // Prefix update
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let token = self.next_token()?;
                let lo = self.span;
                let op = token.to_update_op().ok_or_else(|| {
                    self.fatal("Unexpected token", "Expected ++ or --", lo)
                })?;
                let argument = self.expr(Precedence::PREFIX)?;
                self.check_target(&argument)?;
                let span = lo.merge(self.span);
                Ok(ast::expr(
                    ast::ExprKind::Update {
                        op,
                        prefix: true,
                        argument: Box::new(argument),
                    },
                    span,
                ))
            }
            // Group expression
            TokenKind::LParen => {
                self.expect(&TokenKind::LParen)?;
                let lo = self.span;
                let mut expr = self.expr(Precedence::NONE)?;
                self.expect(&TokenKind::RParen)?;
                // Update the expression to include the wrapping
                // parens
                expr.span = lo.merge(self.span);
                Ok(expr)
            }
            TokenKind::EOF => Err(self.fatal(
                "Unexpected end of expression",
                "Expected an expression here",
                token.span,
            )),
            kind => {
                self.next_token()?;
                Err(self.fatal(
                    &format!("Unexpected token '{}'", kind),
                    "Expected an expression",
                    token.span,
                ))
            }
        }
    }

    fn parse_lit(&mut self) -> Result<ast::Literal> {
        let token = self.next_token()?;
        match token.kind {
            TokenKind::Literal(token::Lit { kind, symbol }) => Ok(match kind {
                LitKind::Number => ast::Literal::Number(symbol.to_string()),
                LitKind::Str => ast::Literal::Str(symbol.to_string()),
                LitKind::Bool => ast::Literal::Bool(symbol.as_str() == "true"),
                LitKind::Null => ast::Literal::Null,
                LitKind::Undefined => ast::Literal::Undefined,
            }),
            _ => Err(self.fatal("Expected literal", "Here", token.span)),
        }
    }

    fn object_expr(&mut self) -> Result<ast::Expr> {
        self.expect(&TokenKind::LCurlyBrace)?;
        let lo = self.span;
        let mut properties = vec![];
        loop {
            if self.eat(&TokenKind::RCurlyBrace)? {
                break;
            }
            let token = self.next_token()?;
            let key = match token.kind {
                TokenKind::Ident(symbol) => symbol.to_string(),
                TokenKind::Literal(lit) => lit.symbol.to_string(),
                TokenKind::Reserved(keyword) => keyword.as_str().to_string(),
                kind => {
                    return Err(self.fatal(
                        &format!("Unexpected token '{}'", kind),
                        "Expected a property key",
                        token.span,
                    ))
                }
            };
            self.expect(&TokenKind::Colon)?;
            let value = self.expr(Precedence::SEQUENCE)?;
            properties.push(ast::Property { key, value });
            if !self.eat(&TokenKind::Comma)? {
                self.expect(&TokenKind::RCurlyBrace)?;
                break;
            }
        }
        let span = lo.merge(self.span);
        Ok(ast::expr(ast::ExprKind::Object(properties), span))
    }

    fn infix_expr(&mut self, left: ast::Expr) -> Result<ast::Expr> {
        use TokenKind::*;
        match self.peek()?.kind {
            // Binary
            Plus | Minus | Div | Mul | Mod | LessThan | LessThanEquals | GreaterThan
            | GreaterThanEquals | DblEquals | TplEquals | NotEquals | NotDblEquals | And | Or
            | Reserved(Keyword::In) => self.binary_expr(left),
            // Assignment
            Equals | PlusEquals | MinusEquals => self.assign_expr(left),
            // Conditional
            Question => self.cond_expr(left),
            // Call
            LParen => self.call_expr(left),
            // Member
            Dot => self.member_expr(left),
            // Index
            LBrace => self.index_expr(left),
            PlusPlus | MinusMinus => self.postfix_expr(left),
            Comma => self.sequence_expr(left),
            BinOr => self.decorator_expr(left),
            _ => {
                let token = self.next_token()?;
                Err(self.fatal(
                    &format!("Unexpected token '{}'", token.kind),
                    "Unknown infix expression",
                    self.span,
                ))
            }
        }
    }

    /// Assignment and update targets must be member chains.
    fn check_target(&self, target: &ast::Expr) -> Result<()> {
        if target.member_path().is_some() {
            Ok(())
        } else {
            Err(self.fatal(
                "Invalid left hand side in assignment",
                "Expected an identifier or a member expression",
                target.span,
            ))
        }
    }

    fn assign_expr(&mut self, left: ast::Expr) -> Result<ast::Expr> {
        self.check_target(&left)?;
        let lo = left.span;
        let token = self.next_token()?;
        let op = token.to_assign_op().ok_or_else(|| {
            self.fatal("Unexpected token", "Expected an assignment operator", token.span)
        })?;
        // Right associative: `a = b = c`
        let right = self.expr(Precedence::DECORATOR)?;
        let kind = ast::ExprKind::Assign(op, Box::new(left), Box::new(right));
        let span = lo.merge(self.span);
        Ok(ast::expr(kind, span))
    }

    fn member_expr(&mut self, obj: ast::Expr) -> Result<ast::Expr> {
        self.expect(&TokenKind::Dot)?;
        let property = self.property_name()?;
        let span = obj.span.merge(self.span);
        Ok(ast::expr(ast::ExprKind::Member(Box::new(obj), property), span))
    }

    fn index_expr(&mut self, obj: ast::Expr) -> Result<ast::Expr> {
        self.expect(&TokenKind::LBrace)?;
        let index = self.expr(Precedence::NONE)?;
        self.expect(&TokenKind::RBrace)?;
        let span = obj.span.merge(self.span);
        Ok(ast::expr(
            ast::ExprKind::Index(Box::new(obj), Box::new(index)),
            span,
        ))
    }

    fn postfix_expr(&mut self, argument: ast::Expr) -> Result<ast::Expr> {
        self.check_target(&argument)?;
        let token = self.next_token()?;
        let op = token.to_update_op().ok_or_else(|| {
            self.fatal("Unexpected token", "Expected ++ or --", token.span)
        })?;
        let span = argument.span.merge(self.span);
        Ok(ast::expr(
            ast::ExprKind::Update {
                op,
                prefix: false,
                argument: Box::new(argument),
            },
            span,
        ))
    }

    fn sequence_expr(&mut self, left: ast::Expr) -> Result<ast::Expr> {
        self.expect(&TokenKind::Comma)?;
        let next = self.expr(Precedence::SEQUENCE)?;
        let span = left.span.merge(self.span);
        let expressions = match left.kind {
            ast::ExprKind::Sequence(mut expressions) => {
                expressions.push(next);
                expressions
            }
            _ => vec![left, next],
        };
        Ok(ast::expr(ast::ExprKind::Sequence(expressions), span))
    }

    /// `value | name` or `value | name: arg, arg`
    fn decorator_expr(&mut self, value: ast::Expr) -> Result<ast::Expr> {
        self.expect(&TokenKind::BinOr)?;
        let name = self.ident()?;
        let mut arguments = vec![];
        if self.eat(&TokenKind::Colon)? {
            loop {
                arguments.push(self.expr(Precedence::DECORATOR)?);
                if !self.eat(&TokenKind::Comma)? {
                    break;
                }
            }
        }
        let span = value.span.merge(self.span);
        let decorator = ast::Decorator { name, arguments };
        let kind = match value.kind {
            ast::ExprKind::Decorated(inner, mut decorators) => {
                decorators.push(decorator);
                ast::ExprKind::Decorated(inner, decorators)
            }
            _ => ast::ExprKind::Decorated(Box::new(value), vec![decorator]),
        };
        Ok(ast::expr(kind, span))
    }

    fn expr_list(&mut self, terminator: &TokenKind) -> Result<Vec<ast::Expr>> {
        let mut exprs = vec![];
        loop {
            if self.eat(terminator)? {
                break;
            }
            exprs.push(self.expr(Precedence::SEQUENCE)?);
            // If we find a comma, move on
            if self.eat(&TokenKind::Comma)? {
                continue;
            }
            self.expect(terminator)?;
            break;
        }
        Ok(exprs)
    }

    fn call_expr(&mut self, callee: ast::Expr) -> Result<ast::Expr> {
        self.expect(&TokenKind::LParen)?;
        let lo = callee.span;
        let arguments = self.expr_list(&TokenKind::RParen)?;
        let span = lo.merge(self.span);
        Ok(ast::expr(
            ast::ExprKind::Call(Box::new(callee), arguments),
            span,
        ))
    }

    fn binary_expr(&mut self, left: ast::Expr) -> Result<ast::Expr> {
        let lo = left.span;
        let token = self.next_token()?;
        let precedence = token.precedence();
        let op = token.to_bin_op().ok_or_else(|| {
            self.fatal("Unexpected token", "Expected a binary operator", token.span)
        })?;
        let right = self.expr(precedence)?;
        let kind = ast::ExprKind::Binary(op, Box::new(left), Box::new(right));
        let span = lo.merge(self.span);
        Ok(ast::expr(kind, span))
    }

    fn cond_expr(&mut self, test: ast::Expr) -> Result<ast::Expr> {
        self.expect(&TokenKind::Question)?;
        let consequent = self.expr(Precedence::SEQUENCE)?;
        self.expect(&TokenKind::Colon)?;
        let alt = self.expr(Precedence::ASSIGNMENT)?;
        let span = test.span.merge(self.span);
        Ok(ast::expr(
            ast::ExprKind::Conditional(Box::new(test), Box::new(consequent), Box::new(alt)),
            span,
        ))
    }
}

/// Parse a standalone expression.
pub fn parse_expression(source: &str) -> Result<ast::Expr> {
    Parser::new(source).parse_expression()
}

pub fn parse_for_header(source: &str) -> Result<ForHeader> {
    Parser::new(source).parse_for_header()
}

impl Iterator for Parser<'_> {
    type Item = Token;
    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Ok(token) => match token.kind {
                TokenKind::EOF => None,
                _ => Some(token),
            },
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use syntax::ast::ExprKind;

    fn canonical(source: &str) -> String {
        parse_expression(source).unwrap().to_source()
    }

    #[test]
    fn respects_precedence() {
        assert_snapshot!(canonical("a+b*c"), @"a + b * c");
        assert_snapshot!(canonical("(a+b)*c"), @"(a + b) * c");
        assert_snapshot!(canonical("a || b && !c"), @"a || b && !c");
        assert_snapshot!(canonical("-a.b[c]"), @"-a.b[c]");
    }

    #[test]
    fn conditional_is_right_associative() {
        assert_snapshot!(canonical("a ? b : c ? d : e"), @"a ? b : c ? d : e");
        let expr = parse_expression("a ? b : c ? d : e").unwrap();
        match expr.kind {
            ExprKind::Conditional(_, _, alternate) => {
                assert!(matches!(alternate.kind, ExprKind::Conditional(..)))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parses_calls_objects_and_arrays() {
        assert_snapshot!(canonical("f(a, {x: 1, 'y-z': [2, 3]})"), @r#"f(a, {x: 1, "y-z": [2, 3]})"#);
        assert_snapshot!(canonical("obj.method().value"), @"obj.method().value");
    }

    #[test]
    fn parses_decorator_chains() {
        let expr = parse_expression("value | trim | format: 'x', 2").unwrap();
        match &expr.kind {
            ExprKind::Decorated(_, decorators) => {
                assert_eq!(decorators.len(), 2);
                assert_eq!(decorators[1].arguments.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_snapshot!(expr.to_source(), @r#"value | trim | format: "x", 2"#);
    }

    #[test]
    fn parses_sequences_and_assignments() {
        assert_snapshot!(canonical("a = 1, b += 2"), @"a = 1, b += 2");
        assert_snapshot!(canonical("i++"), @"i++");
        assert!(parse_expression("f() = 1").is_err());
        assert!(parse_expression("1++").is_err());
    }

    #[test]
    fn rejects_trailing_tokens() {
        let error = parse_expression("a b").unwrap_err();
        assert!(error.message.contains("Unexpected token"));
        assert!(parse_expression("").is_err());
        assert!(parse_expression("(a").is_err());
    }

    #[test]
    fn parses_for_headers() {
        match parse_for_header("key, item in items.list").unwrap() {
            ForHeader::Each {
                key,
                value,
                collection,
            } => {
                assert_eq!(key.map(|key| key.to_str().to_string()), Some("key".into()));
                assert_eq!(value.to_str(), "item");
                assert_eq!(collection.to_source(), "items.list");
            }
            other => panic!("unexpected {:?}", other),
        }
        match parse_for_header("i = 0; i < count; i++").unwrap() {
            ForHeader::Loop { init, test, update } => {
                assert_eq!(init.unwrap().to_source(), "i = 0");
                assert_eq!(test.unwrap().to_source(), "i < count");
                assert_eq!(update.unwrap().to_source(), "i++");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            parse_for_header(";;").unwrap(),
            ForHeader::Loop { init: None, test: None, update: None }
        ));
    }
}
