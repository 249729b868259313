use crate::scalar::parse_date;
use crate::stream::DepthTracker;
use crate::{Error, ErrorKind, Token, TokenStream};

#[derive(Debug, Clone, PartialEq)]
enum Container {
    Object,
    Array,
    Constructor(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Expect {
    /// A value, or the end of the enclosing array or constructor
    Value,

    /// A property name or the end of the enclosing object
    Property,

    /// The `:` between a property name and its value
    Colon,

    /// A separator or the end of the enclosing container
    Separator,
}

/// Splits JSON text into tokens one at a time.
///
/// The lexer is lenient in the way of common JSON readers: it accepts
/// comments, single quoted strings, unquoted property names, `undefined`,
/// `NaN`, `Infinity`, and `new Name(...)` constructors. Strings of the form
/// `"\/Date(ms)\/"` are decoded into dates. Input that ends before every
/// container is closed simply runs out of tokens.
#[derive(Debug)]
pub struct Lexer<'a> {
    data: &'a str,
    pos: usize,
    stack: Vec<Container>,
    expect: Expect,
}

impl<'a> Lexer<'a> {
    pub fn new(data: &'a str) -> Self {
        Lexer {
            data,
            pos: 0,
            stack: Vec::new(),
            expect: Expect::Value,
        }
    }

    /// Byte offset of the next unread character
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.data.as_bytes().get(self.pos).copied()
    }

    fn error(&self, reason: &str) -> Error {
        Error::new(ErrorKind::Parse {
            offset: self.pos,
            reason: reason.to_string(),
        })
    }

    fn skip_whitespace(&mut self) {
        let bytes = self.data.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn after_value(&mut self) {
        self.expect = Expect::Separator;
    }

    /// Read the next token, or `None` at the end of input
    pub fn next_token(&mut self) -> Result<Option<Token>, Error> {
        loop {
            self.skip_whitespace();
            let c = match self.peek() {
                Some(c) => c,
                None => return Ok(None),
            };

            if c == b'/' {
                return self.read_comment().map(Some);
            }

            match self.expect {
                Expect::Colon => {
                    if c != b':' {
                        return Err(self.error("expected ':' after property name"));
                    }
                    self.pos += 1;
                    self.expect = Expect::Value;
                }
                Expect::Separator => match c {
                    b',' if !self.stack.is_empty() => {
                        self.pos += 1;
                        self.expect = match self.stack.last() {
                            Some(Container::Object) => Expect::Property,
                            _ => Expect::Value,
                        };
                    }
                    b'}' | b']' | b')' => return self.close(c).map(Some),
                    _ if self.stack.is_empty() => {
                        return Err(self.error("additional text after the end of the document"))
                    }
                    _ => return Err(self.error("expected ',' or the end of a container")),
                },
                Expect::Property => match c {
                    b'}' => return self.close(c).map(Some),
                    b'"' | b'\'' => {
                        let name = self.read_string(c)?;
                        self.expect = Expect::Colon;
                        return Ok(Some(Token::PropertyName(name)));
                    }
                    _ => {
                        let name = self.read_unquoted_name()?;
                        self.expect = Expect::Colon;
                        return Ok(Some(Token::PropertyName(name)));
                    }
                },
                Expect::Value => return self.read_value(c).map(Some),
            }
        }
    }

    fn close(&mut self, c: u8) -> Result<Token, Error> {
        let token = match (c, self.stack.last()) {
            (b'}', Some(Container::Object)) => Token::EndObject,
            (b']', Some(Container::Array)) => Token::EndArray,
            (b')', Some(Container::Constructor(name))) => Token::EndConstructor(name.clone()),
            _ => return Err(self.error("mismatched closing character")),
        };

        self.pos += 1;
        self.stack.pop();
        self.after_value();
        Ok(token)
    }

    fn read_value(&mut self, c: u8) -> Result<Token, Error> {
        match c {
            b'{' => {
                self.pos += 1;
                self.stack.push(Container::Object);
                self.expect = Expect::Property;
                Ok(Token::StartObject)
            }
            b'[' => {
                self.pos += 1;
                self.stack.push(Container::Array);
                self.expect = Expect::Value;
                Ok(Token::StartArray)
            }
            b']' | b')' => self.close(c),
            b'"' | b'\'' => {
                let s = self.read_string(c)?;
                self.after_value();
                if s.starts_with("/Date(") {
                    if let Some(date) = parse_date(&s) {
                        return Ok(Token::Date(date));
                    }
                }
                Ok(Token::String(s))
            }
            b'-' | b'0'..=b'9' => {
                let token = self.read_number()?;
                self.after_value();
                Ok(token)
            }
            _ if c.is_ascii_alphabetic() => self.read_keyword(),
            _ => Err(self.error("unexpected character while parsing value")),
        }
    }

    fn read_keyword(&mut self) -> Result<Token, Error> {
        let start = self.pos;
        let bytes = self.data.as_bytes();
        while self.pos < bytes.len() && is_identifier(bytes[self.pos]) {
            self.pos += 1;
        }

        let token = match &self.data[start..self.pos] {
            "true" => Token::Boolean(true),
            "false" => Token::Boolean(false),
            "null" => Token::Null,
            "undefined" => Token::Undefined,
            "NaN" => Token::Float(f64::NAN),
            "Infinity" => Token::Float(f64::INFINITY),
            "new" => return self.read_constructor(),
            _ => {
                self.pos = start;
                return Err(self.error("unexpected keyword while parsing value"));
            }
        };

        self.after_value();
        Ok(token)
    }

    fn read_constructor(&mut self) -> Result<Token, Error> {
        self.skip_whitespace();
        let start = self.pos;
        let bytes = self.data.as_bytes();
        while self.pos < bytes.len() && is_identifier(bytes[self.pos]) {
            self.pos += 1;
        }

        if start == self.pos {
            return Err(self.error("expected a constructor name"));
        }

        let name = self.data[start..self.pos].to_string();
        self.skip_whitespace();
        if self.peek() != Some(b'(') {
            return Err(self.error("expected '(' after constructor name"));
        }

        self.pos += 1;
        self.stack.push(Container::Constructor(name.clone()));
        self.expect = Expect::Value;
        Ok(Token::StartConstructor(name))
    }

    fn read_number(&mut self) -> Result<Token, Error> {
        let start = self.pos;
        let bytes = self.data.as_bytes();
        if bytes[self.pos] == b'-' {
            self.pos += 1;
            if self.data[self.pos..].starts_with("Infinity") {
                self.pos += "Infinity".len();
                return Ok(Token::Float(f64::NEG_INFINITY));
            }
        }

        let mut integral = true;
        while let Some(&c) = bytes.get(self.pos) {
            match c {
                b'0'..=b'9' => {}
                b'.' | b'e' | b'E' => integral = false,
                b'+' | b'-' if matches!(bytes[self.pos - 1], b'e' | b'E') => {}
                _ => break,
            }
            self.pos += 1;
        }

        let text = &self.data[start..self.pos];
        if integral {
            if let Ok(x) = text.parse::<i64>() {
                return Ok(Token::Integer(x));
            }
        }

        text.parse::<f64>().map(Token::Float).map_err(|_| Error::new(ErrorKind::Parse {
            offset: start,
            reason: format!("invalid number '{}'", text),
        }))
    }

    fn read_unquoted_name(&mut self) -> Result<String, Error> {
        let start = self.pos;
        let bytes = self.data.as_bytes();
        while self.pos < bytes.len() && is_identifier(bytes[self.pos]) {
            self.pos += 1;
        }

        if start == self.pos {
            return Err(self.error("invalid property name character"));
        }

        Ok(self.data[start..self.pos].to_string())
    }

    fn read_string(&mut self, quote: u8) -> Result<String, Error> {
        let start = self.pos;
        self.pos += 1;
        let bytes = self.data.as_bytes();
        let mut result = String::new();
        let mut run = self.pos;
        loop {
            let c = match bytes.get(self.pos) {
                Some(&c) => c,
                None => {
                    return Err(Error::new(ErrorKind::Parse {
                        offset: start,
                        reason: String::from("unterminated string"),
                    }))
                }
            };

            if c == quote {
                result.push_str(&self.data[run..self.pos]);
                self.pos += 1;
                return Ok(result);
            }

            if c != b'\\' {
                self.pos += 1;
                continue;
            }

            result.push_str(&self.data[run..self.pos]);
            self.pos += 1;
            let escaped = bytes.get(self.pos).copied();
            self.pos += 1;
            match escaped {
                Some(b'"') => result.push('"'),
                Some(b'\'') => result.push('\''),
                Some(b'\\') => result.push('\\'),
                Some(b'/') => result.push('/'),
                Some(b'b') => result.push('\u{8}'),
                Some(b'f') => result.push('\u{c}'),
                Some(b'n') => result.push('\n'),
                Some(b'r') => result.push('\r'),
                Some(b't') => result.push('\t'),
                Some(b'u') => result.push(self.read_unicode_escape()?),
                _ => {
                    self.pos -= 1;
                    return Err(self.error("bad escape sequence"));
                }
            }
            run = self.pos;
        }
    }

    fn read_hex4(&mut self) -> Result<u32, Error> {
        let hex = self
            .data
            .get(self.pos..self.pos + 4)
            .ok_or_else(|| self.error("truncated unicode escape"))?;
        let value = u32::from_str_radix(hex, 16).map_err(|_| self.error("invalid unicode escape"))?;
        self.pos += 4;
        Ok(value)
    }

    fn read_unicode_escape(&mut self) -> Result<char, Error> {
        let high = self.read_hex4()?;
        if !(0xD800..0xDC00).contains(&high) {
            return Ok(char::from_u32(high).unwrap_or(char::REPLACEMENT_CHARACTER));
        }

        if !self.data[self.pos..].starts_with("\\u") {
            return Ok(char::REPLACEMENT_CHARACTER);
        }

        self.pos += 2;
        let low = self.read_hex4()?;
        if !(0xDC00..0xE000).contains(&low) {
            return Ok(char::REPLACEMENT_CHARACTER);
        }

        let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
        Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn read_comment(&mut self) -> Result<Token, Error> {
        let rest = &self.data[self.pos..];
        if let Some(body) = rest.strip_prefix("/*") {
            let end = body
                .find("*/")
                .ok_or_else(|| self.error("unterminated comment"))?;
            let text = body[..end].to_string();
            self.pos += 2 + end + 2;
            Ok(Token::Comment(text))
        } else if let Some(body) = rest.strip_prefix("//") {
            let end = body.find(['\r', '\n']).unwrap_or(body.len());
            let text = body[..end].to_string();
            self.pos += 2 + end;
            Ok(Token::Comment(text))
        } else {
            Err(self.error("expected '*' or '/' to start a comment"))
        }
    }
}

#[inline]
fn is_identifier(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'$' || c >= 0x80
}

/// A [`TokenStream`] that lexes JSON text on demand
///
/// ```
/// use graft::{JsonReader, Token, TokenStream};
///
/// let mut reader = JsonReader::new(r#"{'name': "Ann" /* hi */}"#);
/// let mut tokens = Vec::new();
/// while reader.advance()? {
///     tokens.push(reader.token().clone());
/// }
/// assert_eq!(tokens, vec![
///     Token::StartObject,
///     Token::PropertyName(String::from("name")),
///     Token::String(String::from("Ann")),
///     Token::Comment(String::from(" hi ")),
///     Token::EndObject,
/// ]);
/// # Ok::<(), graft::Error>(())
/// ```
#[derive(Debug)]
pub struct JsonReader<'a> {
    lexer: Lexer<'a>,
    token: Token,
    tracker: DepthTracker,
}

impl<'a> JsonReader<'a> {
    pub fn new(data: &'a str) -> Self {
        JsonReader {
            lexer: Lexer::new(data),
            token: Token::None,
            tracker: DepthTracker::default(),
        }
    }

    /// Byte offset of the next unread character
    pub fn position(&self) -> usize {
        self.lexer.position()
    }
}

impl<'a> TokenStream for JsonReader<'a> {
    #[inline]
    fn token(&self) -> &Token {
        &self.token
    }

    fn advance(&mut self) -> Result<bool, Error> {
        match self.lexer.next_token()? {
            Some(token) => {
                self.tracker.step(token.kind());
                self.token = token;
                Ok(true)
            }
            None => {
                self.token = Token::None;
                Ok(false)
            }
        }
    }

    #[inline]
    fn depth(&self) -> usize {
        self.tracker.depth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use quickcheck_macros::quickcheck;
    use rstest::rstest;

    fn lex(data: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(data);
        let mut result = Vec::new();
        while let Some(token) = lexer.next_token().unwrap() {
            result.push(token);
        }
        result
    }

    fn lex_err(data: &str) -> Error {
        let mut lexer = Lexer::new(data);
        loop {
            match lexer.next_token() {
                Ok(Some(_)) => {}
                Ok(None) => panic!("expected an error for {}", data),
                Err(e) => return e,
            }
        }
    }

    #[test]
    fn test_simple_object() {
        assert_eq!(
            lex(r#"{"a": 1, "b": [true, null, 2.5], "c": {}}"#),
            vec![
                Token::StartObject,
                Token::PropertyName("a".into()),
                Token::Integer(1),
                Token::PropertyName("b".into()),
                Token::StartArray,
                Token::Boolean(true),
                Token::Null,
                Token::Float(2.5),
                Token::EndArray,
                Token::PropertyName("c".into()),
                Token::StartObject,
                Token::EndObject,
                Token::EndObject,
            ]
        );
    }

    #[test]
    fn test_lenient_syntax() {
        assert_eq!(
            lex("{name: 'O\\'Neil', $id: \"1\", list: [1,], u: undefined}"),
            vec![
                Token::StartObject,
                Token::PropertyName("name".into()),
                Token::String("O'Neil".into()),
                Token::PropertyName("$id".into()),
                Token::String("1".into()),
                Token::PropertyName("list".into()),
                Token::StartArray,
                Token::Integer(1),
                Token::EndArray,
                Token::PropertyName("u".into()),
                Token::Undefined,
                Token::EndObject,
            ]
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            lex("// leading\n[1 /* one */, 2]"),
            vec![
                Token::Comment(" leading".into()),
                Token::StartArray,
                Token::Integer(1),
                Token::Comment(" one ".into()),
                Token::Integer(2),
                Token::EndArray,
            ]
        );
    }

    #[test]
    fn test_constructor() {
        assert_eq!(
            lex("new Date( 1, 'a' )"),
            vec![
                Token::StartConstructor("Date".into()),
                Token::Integer(1),
                Token::String("a".into()),
                Token::EndConstructor("Date".into()),
            ]
        );
    }

    #[test]
    fn test_dates() {
        let expected = Utc.timestamp_millis_opt(1_234_567_890_000).unwrap();
        assert_eq!(lex(r#""\/Date(1234567890000)\/""#), vec![Token::Date(expected)]);
        assert_eq!(lex(r#""/Date(nope)/""#), vec![Token::String("/Date(nope)/".into())]);
    }

    #[rstest]
    #[case("-12", Token::Integer(-12))]
    #[case("1e3", Token::Float(1000.0))]
    #[case("1.5E-2", Token::Float(0.015))]
    #[case("9223372036854775808", Token::Float(9223372036854775808.0))]
    #[case("-Infinity", Token::Float(f64::NEG_INFINITY))]
    #[case(r#""é😀""#, Token::String("é😀".into()))]
    #[case(r#""tab\there""#, Token::String("tab\there".into()))]
    fn test_scalars(#[case] input: &str, #[case] expected: Token) {
        assert_eq!(lex(input), vec![expected]);
    }

    #[test]
    fn test_nan() {
        match lex("NaN").as_slice() {
            [Token::Float(x)] => assert!(x.is_nan()),
            x => panic!("unexpected tokens {:?}", x),
        }
    }

    #[test]
    fn test_truncated_input_runs_out() {
        assert_eq!(
            lex(r#"{"a": [1"#),
            vec![
                Token::StartObject,
                Token::PropertyName("a".into()),
                Token::StartArray,
                Token::Integer(1),
            ]
        );
    }

    #[rstest]
    #[case(r#""abc"#, 0)]
    #[case("[1 2]", 3)]
    #[case("{\"a\" 1}", 5)]
    #[case("[}", 1)]
    #[case("/* open", 0)]
    #[case("[@]", 1)]
    #[case("1 2", 2)]
    fn test_parse_errors(#[case] input: &str, #[case] offset: usize) {
        let err = lex_err(input);
        match err.kind() {
            ErrorKind::Parse { offset: x, .. } => assert_eq!(*x, offset),
            x => panic!("unexpected error {:?}", x),
        }
    }

    #[quickcheck]
    fn lex_integers(x: i64) -> bool {
        lex(&x.to_string()) == vec![Token::Integer(x)]
    }

    #[test]
    fn test_reader_depth() {
        let mut reader = JsonReader::new("[[1], 2]");
        let mut depths = Vec::new();
        while reader.advance().unwrap() {
            depths.push(reader.depth());
        }
        assert_eq!(depths, vec![0, 1, 2, 1, 1, 0]);
        assert_eq!(reader.token(), &Token::None);
    }
}
