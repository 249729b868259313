use crate::Scalar;
use chrono::{DateTime, Utc};
use std::fmt;

/// A single structural or value marker of a serialized document
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Nothing has been read yet
    None,

    /// `{`
    StartObject,

    /// `}`
    EndObject,

    /// `[`
    StartArray,

    /// `]`
    EndArray,

    /// The name half of an object property. The value is the next token.
    PropertyName(String),

    /// A number without a fraction or exponent that fits in an `i64`
    Integer(i64),

    /// Any other number
    Float(f64),

    /// A string that was not recognized as a date
    String(String),

    /// `true` or `false`
    Boolean(bool),

    /// A date string such as `"\/Date(1234567890000)\/"`
    Date(DateTime<Utc>),

    /// `null`
    Null,

    /// `undefined`
    Undefined,

    /// `new Name(`, carrying the constructor name
    StartConstructor(String),

    /// The `)` closing a constructor, carrying the constructor name
    EndConstructor(String),

    /// A `/* */` or `//` comment
    Comment(String),
}

/// The variant of a [`Token`] without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    None,
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    PropertyName,
    Integer,
    Float,
    String,
    Boolean,
    Date,
    Null,
    Undefined,
    StartConstructor,
    EndConstructor,
    Comment,
}

impl Token {
    /// The variant of this token
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::None => TokenKind::None,
            Token::StartObject => TokenKind::StartObject,
            Token::EndObject => TokenKind::EndObject,
            Token::StartArray => TokenKind::StartArray,
            Token::EndArray => TokenKind::EndArray,
            Token::PropertyName(_) => TokenKind::PropertyName,
            Token::Integer(_) => TokenKind::Integer,
            Token::Float(_) => TokenKind::Float,
            Token::String(_) => TokenKind::String,
            Token::Boolean(_) => TokenKind::Boolean,
            Token::Date(_) => TokenKind::Date,
            Token::Null => TokenKind::Null,
            Token::Undefined => TokenKind::Undefined,
            Token::StartConstructor(_) => TokenKind::StartConstructor,
            Token::EndConstructor(_) => TokenKind::EndConstructor,
            Token::Comment(_) => TokenKind::Comment,
        }
    }

    /// Returns the decoded value of a scalar token
    ///
    /// ```
    /// use graft::{Scalar, Token};
    ///
    /// assert_eq!(Token::Integer(3).scalar(), Some(Scalar::I64(3)));
    /// assert_eq!(Token::StartObject.scalar(), None);
    /// ```
    pub fn scalar(&self) -> Option<Scalar> {
        match self {
            Token::Integer(x) => Some(Scalar::I64(*x)),
            Token::Float(x) => Some(Scalar::F64(*x)),
            Token::String(x) => Some(Scalar::String(x.clone())),
            Token::Boolean(x) => Some(Scalar::Bool(*x)),
            Token::Date(x) => Some(Scalar::Date(*x)),
            _ => None,
        }
    }

    /// The token's value rendered as text, if it carries one. Used for
    /// reading metadata such as `$id` where any scalar is accepted.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Token::PropertyName(x)
            | Token::String(x)
            | Token::StartConstructor(x)
            | Token::EndConstructor(x) => Some(x.clone()),
            _ => self.scalar().map(|x| x.to_string()),
        }
    }
}

impl TokenKind {
    /// `StartObject`, `StartArray`, or `StartConstructor`
    pub fn is_start(self) -> bool {
        matches!(
            self,
            TokenKind::StartObject | TokenKind::StartArray | TokenKind::StartConstructor
        )
    }

    /// `EndObject`, `EndArray`, or `EndConstructor`
    pub fn is_end(self) -> bool {
        matches!(
            self,
            TokenKind::EndObject | TokenKind::EndArray | TokenKind::EndConstructor
        )
    }

    /// Tokens that decode to a [`Scalar`]
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            TokenKind::Integer
                | TokenKind::Float
                | TokenKind::String
                | TokenKind::Boolean
                | TokenKind::Date
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::None => "None",
            TokenKind::StartObject => "StartObject",
            TokenKind::EndObject => "EndObject",
            TokenKind::StartArray => "StartArray",
            TokenKind::EndArray => "EndArray",
            TokenKind::PropertyName => "PropertyName",
            TokenKind::Integer => "Integer",
            TokenKind::Float => "Float",
            TokenKind::String => "String",
            TokenKind::Boolean => "Boolean",
            TokenKind::Date => "Date",
            TokenKind::Null => "Null",
            TokenKind::Undefined => "Undefined",
            TokenKind::StartConstructor => "StartConstructor",
            TokenKind::EndConstructor => "EndConstructor",
            TokenKind::Comment => "Comment",
        };
        f.write_str(name)
    }
}
