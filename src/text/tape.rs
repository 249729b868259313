use super::lexer::Lexer;
use crate::{Error, TapeStream, Token};

/// Creates a parser that writes JSON tokens to a tape
#[derive(Debug, Default)]
pub struct JsonTapeParser;

impl JsonTapeParser {
    /// Create a tape parser
    pub fn new() -> Self {
        JsonTapeParser
    }

    /// Lex the text and return the token tape
    pub fn parse_str(self, data: &str) -> Result<JsonTape, Error> {
        let mut res = JsonTape::default();
        self.parse_str_into_tape(data, &mut res)?;
        Ok(res)
    }

    /// Lex the text into the given tape. The tape is cleared beforehand, so
    /// its allocation can be reused between documents.
    pub fn parse_str_into_tape(self, data: &str, tape: &mut JsonTape) -> Result<(), Error> {
        tape.tokens.clear();
        let mut lexer = Lexer::new(data);
        while let Some(token) = lexer.next_token()? {
            tape.tokens.push(token);
        }
        Ok(())
    }
}

/// Houses the tokens of a whole JSON document
///
/// ```
/// use graft::{JsonTape, Token};
///
/// let tape = JsonTape::from_str(r#"{"a": [1]}"#)?;
/// assert_eq!(tape.tokens().len(), 6);
/// assert_eq!(tape.tokens()[1], Token::PropertyName(String::from("a")));
/// # Ok::<(), graft::Error>(())
/// ```
#[derive(Debug, Default, Clone, PartialEq)]
pub struct JsonTape {
    tokens: Vec<Token>,
}

impl JsonTape {
    /// Creates a new tape without any tokens
    pub fn new() -> Self {
        JsonTape::default()
    }

    /// Convenience method for lexing the given text
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(data: &str) -> Result<JsonTape, Error> {
        JsonTapeParser.parse_str(data)
    }

    /// Returns a parser for text data
    pub fn parser() -> JsonTapeParser {
        JsonTapeParser
    }

    /// Return the parsed tokens
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// A fresh stream positioned before the first token
    pub fn stream(&self) -> TapeStream<'_> {
        TapeStream::new(&self.tokens)
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }
}

impl From<Vec<Token>> for JsonTape {
    fn from(tokens: Vec<Token>) -> Self {
        JsonTape { tokens }
    }
}

impl FromIterator<Token> for JsonTape {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        JsonTape {
            tokens: iter.into_iter().collect(),
        }
    }
}
