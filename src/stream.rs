use crate::{Error, ErrorKind, Token, TokenKind};

/// A forward-only source of tokens.
///
/// A stream starts positioned before its first token, where [`token`]
/// returns [`Token::None`]. Each [`advance`] moves to the next token and
/// reports whether one was available.
///
/// [`token`]: TokenStream::token
/// [`advance`]: TokenStream::advance
pub trait TokenStream {
    /// The current token
    fn token(&self) -> &Token;

    /// Move to the next token. Returns false once the stream is exhausted.
    fn advance(&mut self) -> Result<bool, Error>;

    /// The number of containers enclosing the current token. A start token
    /// reports the depth it opens at and its end token reports the same
    /// depth.
    fn depth(&self) -> usize;

    /// The variant of the current token
    fn kind(&self) -> TokenKind {
        self.token().kind()
    }

    /// Move past the value at the current position, leaving the stream on
    /// its last token. On a property name, the property's value is skipped
    /// too.
    fn skip_subtree(&mut self) -> Result<(), Error> {
        if self.kind() == TokenKind::PropertyName {
            if !self.advance()? {
                return Err(Error::new(ErrorKind::UnexpectedEnd {
                    context: "skipping a property value",
                }));
            }
        }

        if !self.kind().is_start() {
            return Ok(());
        }

        let depth = self.depth();
        loop {
            if !self.advance()? {
                return Err(Error::new(ErrorKind::UnexpectedEnd {
                    context: "skipping a nested value",
                }));
            }

            if self.kind().is_end() && self.depth() == depth {
                return Ok(());
            }
        }
    }
}

impl<S: TokenStream + ?Sized> TokenStream for &'_ mut S {
    fn token(&self) -> &Token {
        (**self).token()
    }

    fn advance(&mut self) -> Result<bool, Error> {
        (**self).advance()
    }

    fn depth(&self) -> usize {
        (**self).depth()
    }

    fn kind(&self) -> TokenKind {
        (**self).kind()
    }

    fn skip_subtree(&mut self) -> Result<(), Error> {
        (**self).skip_subtree()
    }
}

/// Tracks how many containers enclose the current token as a stream moves
/// forward
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct DepthTracker {
    depth: usize,
    opened: bool,
}

impl DepthTracker {
    /// Account for a newly current token
    #[inline]
    pub(crate) fn step(&mut self, kind: TokenKind) {
        if self.opened {
            self.depth += 1;
        }

        if kind.is_end() {
            self.depth = self.depth.saturating_sub(1);
        }

        self.opened = kind.is_start();
    }

    #[inline]
    pub(crate) fn depth(&self) -> usize {
        self.depth
    }
}

static NONE: Token = Token::None;

/// A [`TokenStream`] over an in-memory slice of tokens
///
/// ```
/// use graft::{TapeStream, Token, TokenKind, TokenStream};
///
/// let tokens = [Token::StartArray, Token::Integer(1), Token::EndArray];
/// let mut stream = TapeStream::new(&tokens);
/// assert_eq!(stream.kind(), TokenKind::None);
/// assert!(stream.advance()?);
/// stream.skip_subtree()?;
/// assert_eq!(stream.kind(), TokenKind::EndArray);
/// assert!(!stream.advance()?);
/// # Ok::<(), graft::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct TapeStream<'a> {
    tokens: &'a [Token],
    idx: Option<usize>,
    tracker: DepthTracker,
}

impl<'a> TapeStream<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        TapeStream {
            tokens,
            idx: None,
            tracker: DepthTracker::default(),
        }
    }

    /// Index of the current token, if the stream has started and is not
    /// exhausted
    pub fn position(&self) -> Option<usize> {
        self.idx.filter(|&x| x < self.tokens.len())
    }
}

impl<'a> TokenStream for TapeStream<'a> {
    #[inline]
    fn token(&self) -> &Token {
        match self.position() {
            Some(idx) => &self.tokens[idx],
            None => &NONE,
        }
    }

    #[inline]
    fn advance(&mut self) -> Result<bool, Error> {
        let next = self.idx.map_or(0, |x| x + 1);
        if next >= self.tokens.len() {
            self.idx = Some(self.tokens.len());
            return Ok(false);
        }

        self.idx = Some(next);
        self.tracker.step(self.tokens[next].kind());
        Ok(true)
    }

    #[inline]
    fn depth(&self) -> usize {
        self.tracker.depth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens() -> Vec<Token> {
        vec![
            Token::StartObject,
            Token::PropertyName("a".into()),
            Token::StartArray,
            Token::Integer(1),
            Token::StartObject,
            Token::EndObject,
            Token::EndArray,
            Token::PropertyName("b".into()),
            Token::Boolean(true),
            Token::EndObject,
        ]
    }

    #[test]
    fn depth_tracks_nesting() {
        let tokens = tokens();
        let mut stream = TapeStream::new(&tokens);
        let mut depths = Vec::new();
        while stream.advance().unwrap() {
            depths.push(stream.depth());
        }
        assert_eq!(depths, vec![0, 1, 1, 2, 2, 2, 1, 1, 1, 0]);
        assert_eq!(stream.token(), &Token::None);
    }

    #[test]
    fn skip_property_value() {
        let tokens = tokens();
        let mut stream = TapeStream::new(&tokens);
        stream.advance().unwrap();
        stream.advance().unwrap();
        stream.skip_subtree().unwrap();
        assert_eq!(stream.kind(), TokenKind::EndArray);
        stream.advance().unwrap();
        stream.skip_subtree().unwrap();
        assert_eq!(stream.token(), &Token::Boolean(true));
    }

    #[test]
    fn skip_truncated() {
        let tokens = &tokens()[..5];
        let mut stream = TapeStream::new(tokens);
        stream.advance().unwrap();
        let err = stream.skip_subtree().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnexpectedEnd { .. }));
    }
}
