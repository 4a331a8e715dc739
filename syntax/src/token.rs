use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ast::{AssignOp, BinOp, UnOp, UpdateOp};
use crate::precedence::Precedence;
use crate::symbol::Symbol;
use source::diagnostics::Span;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// Binding power of the token when it appears in infix or postfix
    /// position.
    pub fn precedence(&self) -> Precedence {
        use Precedence::{
            AND, ASSIGNMENT, CALL, COMPARE, CONDITIONAL, DECORATOR, EQUALITY, NONE, OR, POSTFIX,
            PRODUCT, SEQUENCE, SUM,
        };
        use TokenKind::*;
        match self.kind {
            Comma => SEQUENCE,
            BinOr => DECORATOR,
            Equals | PlusEquals | MinusEquals => ASSIGNMENT,
            Question => CONDITIONAL,
            Or => OR,
            And => AND,
            DblEquals | TplEquals | NotEquals | NotDblEquals => EQUALITY,
            LessThan | LessThanEquals | GreaterThan | GreaterThanEquals => COMPARE,
            Reserved(Keyword::In) => COMPARE,
            Plus | Minus => SUM,
            Mul | Div | Mod => PRODUCT,
            PlusPlus | MinusMinus => POSTFIX,
            Dot | LParen | LBrace => CALL,
            _ => NONE,
        }
    }

    /// Translate a token to a binary operator AST node
    pub fn to_bin_op(&self) -> Option<BinOp> {
        use BinOp::*;
        match self.kind {
            TokenKind::Plus => Some(Add),
            TokenKind::Minus => Some(Sub),
            TokenKind::Mul => Some(Mul),
            TokenKind::Div => Some(Div),
            TokenKind::Mod => Some(Mod),
            TokenKind::And => Some(And),
            TokenKind::Or => Some(Or),
            TokenKind::DblEquals => Some(Eq),
            TokenKind::TplEquals => Some(StrictEq),
            TokenKind::NotEquals => Some(NotEq),
            TokenKind::NotDblEquals => Some(StrictNotEq),
            TokenKind::LessThan => Some(Less),
            TokenKind::LessThanEquals => Some(LessEq),
            TokenKind::GreaterThan => Some(Greater),
            TokenKind::GreaterThanEquals => Some(GreaterEq),
            TokenKind::Reserved(Keyword::In) => Some(In),
            _ => None,
        }
    }

    /// Translate a token to an unary operator AST node
    pub fn to_un_op(&self) -> Option<UnOp> {
        use UnOp::{Minus, Negate, Plus, Typeof};
        match self.kind {
            TokenKind::Plus => Some(Plus),
            TokenKind::Minus => Some(Minus),
            TokenKind::Exclaim => Some(Negate),
            TokenKind::Reserved(Keyword::Typeof) => Some(Typeof),
            _ => None,
        }
    }

    /// Translate a token to an assignment operator AST node
    pub fn to_assign_op(&self) -> Option<AssignOp> {
        use AssignOp::{Equals, MinusEquals, PlusEquals};
        match self.kind {
            TokenKind::Equals => Some(Equals),
            TokenKind::PlusEquals => Some(PlusEquals),
            TokenKind::MinusEquals => Some(MinusEquals),
            _ => None,
        }
    }

    pub fn to_update_op(&self) -> Option<UpdateOp> {
        match self.kind {
            TokenKind::PlusPlus => Some(UpdateOp::Increment),
            TokenKind::MinusMinus => Some(UpdateOp::Decrement),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

#[inline]
pub fn token(kind: TokenKind, span: Span) -> Token {
    Token { kind, span }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenKind {
    /* Literals */
    Literal(Lit),
    /* End of input */
    EOF,
    /* Reserved words such as keywords */
    Reserved(Keyword),
    /* Identifier */
    Ident(Symbol),
    // `=`
    Equals,
    // `==`
    DblEquals,
    // `===`
    TplEquals,
    // `!=`
    NotEquals,
    // `!==`
    NotDblEquals,
    // `+=`
    PlusEquals,
    // `-=`
    MinusEquals,
    // `||`
    Or,
    // `&&`
    And,
    // `!`
    Exclaim,
    // Decorator chain, `|`
    BinOr,
    // `++`
    PlusPlus,
    // `--`
    MinusMinus,
    // `(`
    LParen,
    // `)`
    RParen,
    // `{`
    LCurlyBrace,
    // `}`
    RCurlyBrace,
    // `[`
    LBrace,
    // `]`
    RBrace,
    // `<`
    LessThan,
    // `<=`
    LessThanEquals,
    // `>`
    GreaterThan,
    // `>=`
    GreaterThanEquals,
    // `:`
    Colon,
    // `;`
    Semi,
    // `.`
    Dot,
    // `%`
    Mod,
    // `?`
    Question,
    // `,`
    Comma,
    // `+`
    Plus,
    // `-`
    Minus,
    // `*`
    Mul,
    // `/`
    Div,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;
        let text = match self {
            Literal(lit) => return write!(f, "{}", lit.symbol),
            EOF => "end of expression",
            Reserved(keyword) => keyword.as_str(),
            Ident(symbol) => return write!(f, "{}", symbol),
            Equals => "=",
            DblEquals => "==",
            TplEquals => "===",
            NotEquals => "!=",
            NotDblEquals => "!==",
            PlusEquals => "+=",
            MinusEquals => "-=",
            Or => "||",
            And => "&&",
            Exclaim => "!",
            BinOr => "|",
            PlusPlus => "++",
            MinusMinus => "--",
            LParen => "(",
            RParen => ")",
            LCurlyBrace => "{",
            RCurlyBrace => "}",
            LBrace => "[",
            RBrace => "]",
            LessThan => "<",
            LessThanEquals => "<=",
            GreaterThan => ">",
            GreaterThanEquals => ">=",
            Colon => ":",
            Semi => ";",
            Dot => ".",
            Mod => "%",
            Question => "?",
            Comma => ",",
            Plus => "+",
            Minus => "-",
            Mul => "*",
            Div => "/",
        };
        f.write_str(text)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Keyword {
    Typeof,
    In,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Typeof => "typeof",
            Keyword::In => "in",
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum LitKind {
    Bool,
    Number,
    Str,
    Null,
    Undefined,
}

/// A literal token. For strings the symbol holds the unescaped value.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Lit {
    pub kind: LitKind,
    pub symbol: Symbol,
}
