use crate::Token;
use std::fmt::Write;

/// Writes tokens back out as compact JSON text.
///
/// Used to capture a subtree verbatim. The writer trusts that the tokens
/// are well formed; it only decides where separators go.
///
/// ```
/// use graft::{Token, TokenWriter};
///
/// let mut out = String::new();
/// let mut writer = TokenWriter::new(&mut out);
/// for token in [
///     Token::StartObject,
///     Token::PropertyName(String::from("a")),
///     Token::StartArray,
///     Token::Integer(1),
///     Token::String(String::from("b\"c")),
///     Token::EndArray,
///     Token::EndObject,
/// ] {
///     writer.write_token(&token);
/// }
/// assert_eq!(out, r#"{"a":[1,"b\"c"]}"#);
/// ```
#[derive(Debug)]
pub struct TokenWriter<'a> {
    out: &'a mut String,

    // whether a separator is due before the next element, per container
    pending: Vec<bool>,
    after_property: bool,
}

impl<'a> TokenWriter<'a> {
    pub fn new(out: &'a mut String) -> Self {
        TokenWriter {
            out,
            pending: Vec::new(),
            after_property: false,
        }
    }

    fn element_start(&mut self) {
        if self.after_property {
            self.after_property = false;
            return;
        }

        if let Some(pending) = self.pending.last_mut() {
            if *pending {
                self.out.push(',');
            }
            *pending = true;
        }
    }

    pub fn write_token(&mut self, token: &Token) {
        match token {
            Token::None => {}
            // only a line comment can contain the block terminator
            Token::Comment(text) if text.contains("*/") => {
                self.out.push_str("//");
                self.out.push_str(text);
                self.out.push('\n');
            }
            Token::Comment(text) => {
                self.out.push_str("/*");
                self.out.push_str(text);
                self.out.push_str("*/");
            }
            Token::EndObject => self.close('}'),
            Token::EndArray => self.close(']'),
            Token::EndConstructor(_) => self.close(')'),
            Token::StartObject => self.open("{"),
            Token::StartArray => self.open("["),
            Token::StartConstructor(name) => {
                self.element_start();
                self.out.push_str("new ");
                self.out.push_str(name);
                self.out.push('(');
                self.pending.push(false);
            }
            Token::PropertyName(name) => {
                self.element_start();
                write_escaped(self.out, name, '"', true);
                self.out.push(':');
                self.after_property = true;
            }
            Token::Integer(x) => {
                self.element_start();
                write_integer(self.out, *x);
            }
            Token::Float(x) => {
                self.element_start();
                write_float(self.out, *x);
            }
            Token::String(x) => {
                self.element_start();
                write_escaped(self.out, x, '"', true);
            }
            Token::Boolean(x) => {
                self.element_start();
                self.out.push_str(if *x { "true" } else { "false" });
            }
            Token::Date(x) => {
                self.element_start();
                write_date(self.out, x.timestamp_millis());
            }
            Token::Null => {
                self.element_start();
                self.out.push_str("null");
            }
            Token::Undefined => {
                self.element_start();
                self.out.push_str("undefined");
            }
        }
    }

    fn open(&mut self, c: &str) {
        self.element_start();
        self.out.push_str(c);
        self.pending.push(false);
    }

    fn close(&mut self, c: char) {
        self.pending.pop();
        self.out.push(c);
    }
}

#[cfg(feature = "faster_writer")]
fn write_integer(out: &mut String, x: i64) {
    let mut buffer = itoa::Buffer::new();
    out.push_str(buffer.format(x));
}

#[cfg(not(feature = "faster_writer"))]
fn write_integer(out: &mut String, x: i64) {
    let _ = write!(out, "{}", x);
}

/// Dates are written in the `"\/Date(ms)\/"` form the lexer reads back
fn write_date(out: &mut String, millis: i64) {
    out.push_str("\"\\/Date(");
    write_integer(out, millis);
    out.push_str(")\\/\"");
}

fn write_float(out: &mut String, x: f64) {
    if x.is_nan() {
        out.push_str("NaN");
    } else if x.is_infinite() {
        out.push_str(if x > 0.0 { "Infinity" } else { "-Infinity" });
    } else {
        let _ = write!(out, "{:?}", x);
    }
}

/// Append `value` as a string literal. Only the chosen delimiter is escaped
/// among the two quote characters; control characters become `\uXXXX`
/// unless they have a short escape.
///
/// ```
/// let mut out = String::new();
/// graft::write_escaped(&mut out, "it's \"x\"\n", '\'', true);
/// assert_eq!(out, r#"'it\'s "x"\n'"#);
/// ```
pub fn write_escaped(out: &mut String, value: &str, delimiter: char, append_delimiters: bool) {
    if append_delimiters {
        out.push(delimiter);
    }

    for c in value.chars() {
        match c {
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{c}' => out.push_str("\\f"),
            '\u{8}' => out.push_str("\\b"),
            '\\' => out.push_str("\\\\"),
            '\u{85}' => out.push_str("\\u0085"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            '\'' | '"' if c == delimiter => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }

    if append_delimiters {
        out.push(delimiter);
    }
}

/// [`write_escaped`] into a new string using double quotes
pub fn to_escaped(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    write_escaped(&mut out, value, '"', true);
    out
}
