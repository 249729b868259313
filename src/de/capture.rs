use super::{advance_or_end, unexpected, Materializer};
use crate::{Error, ErrorKind, RawJson, Token, TokenKind, TokenStream, TokenWriter};
use chrono::SecondsFormat;
use serde_json::{Map, Number};

/// A scratch string borrowed from a pool. The buffer goes back to the pool
/// when the guard drops.
struct Scratch<'p> {
    pool: &'p mut Vec<String>,
    buf: String,
}

impl<'p> Scratch<'p> {
    fn take(pool: &'p mut Vec<String>) -> Self {
        let buf = pool.pop().unwrap_or_default();
        Scratch { pool, buf }
    }
}

impl Drop for Scratch<'_> {
    fn drop(&mut self) {
        let mut buf = std::mem::take(&mut self.buf);
        buf.clear();
        self.pool.push(buf);
    }
}

fn non_finite(x: f64) -> &'static str {
    if x.is_nan() {
        "NaN"
    } else if x > 0.0 {
        "Infinity"
    } else {
        "-Infinity"
    }
}

impl<'a> Materializer<'a> {
    /// Re-emit the subtree at the current token as JSON text
    pub(super) fn capture_raw(&mut self, stream: &mut dyn TokenStream) -> Result<RawJson, Error> {
        while stream.kind() == TokenKind::Comment {
            advance_or_end(stream, "capturing raw json")?;
        }

        let mut scratch = Scratch::take(&mut self.scratch);
        let mut writer = TokenWriter::new(&mut scratch.buf);
        writer.write_token(stream.token());
        if stream.kind().is_start() {
            let depth = stream.depth();
            loop {
                advance_or_end(stream, "capturing raw json")?;
                writer.write_token(stream.token());
                if stream.kind().is_end() && stream.depth() == depth {
                    break;
                }
            }
        }

        Ok(RawJson::new(scratch.buf.clone()))
    }

    /// Build a loosely typed tree from the subtree at the current token.
    /// Special properties are kept as ordinary properties.
    pub(super) fn capture_tree(&mut self, stream: &mut dyn TokenStream) -> Result<serde_json::Value, Error> {
        self.tree_value(stream, self.depth)
    }

    /// Build a tree object from the remaining properties of an object whose
    /// start token has already been consumed
    pub(super) fn capture_tree_fields(
        &mut self,
        stream: &mut dyn TokenStream,
    ) -> Result<serde_json::Value, Error> {
        self.tree_fields(stream, self.depth)
    }

    fn tree_value(&mut self, stream: &mut dyn TokenStream, depth: usize) -> Result<serde_json::Value, Error> {
        if depth >= self.settings.max_depth() {
            return Err(Error::new(ErrorKind::DepthLimit {
                limit: self.settings.max_depth(),
            }));
        }

        loop {
            let value = match stream.token() {
                Token::StartObject => {
                    advance_or_end(stream, "building an object")?;
                    return self.tree_fields(stream, depth + 1);
                }
                Token::StartArray => {
                    let mut items = Vec::new();
                    loop {
                        advance_or_end(stream, "building an array")?;
                        match stream.kind() {
                            TokenKind::EndArray => return Ok(serde_json::Value::Array(items)),
                            TokenKind::Comment => {}
                            _ => {
                                let item = self
                                    .tree_value(stream, depth + 1)
                                    .map_err(|e| e.at_index(items.len()))?;
                                items.push(item);
                            }
                        }
                    }
                }
                Token::StartConstructor(name) => {
                    let name = name.clone();
                    stream.skip_subtree()?;
                    serde_json::Value::String(name)
                }
                Token::EndConstructor(name) => serde_json::Value::String(name.clone()),
                Token::Integer(x) => serde_json::Value::Number(Number::from(*x)),
                // json numbers have no NaN or infinities
                Token::Float(x) => match Number::from_f64(*x) {
                    Some(n) => serde_json::Value::Number(n),
                    None => serde_json::Value::String(non_finite(*x).to_string()),
                },
                Token::String(x) => serde_json::Value::String(x.clone()),
                Token::Boolean(x) => serde_json::Value::Bool(*x),
                Token::Date(x) => serde_json::Value::String(x.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
                Token::Null | Token::Undefined => serde_json::Value::Null,
                Token::Comment(_) => {
                    advance_or_end(stream, "building a value")?;
                    continue;
                }
                Token::None | Token::EndObject | Token::EndArray | Token::PropertyName(_) => {
                    return Err(unexpected(stream, "building a value"))
                }
            };

            return Ok(value);
        }
    }

    fn tree_fields(&mut self, stream: &mut dyn TokenStream, depth: usize) -> Result<serde_json::Value, Error> {
        let mut fields = Map::new();
        loop {
            match stream.token() {
                Token::PropertyName(name) => {
                    let name = name.clone();
                    advance_or_end(stream, "building an object")?;
                    let value = self
                        .tree_value(stream, depth)
                        .map_err(|e| e.at_property(&name))?;
                    fields.insert(name, value);
                }
                Token::EndObject => return Ok(serde_json::Value::Object(fields)),
                Token::Comment(_) => {}
                _ => return Err(unexpected(stream, "building an object")),
            }

            advance_or_end(stream, "building an object")?;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{JsonReader, Materializer, Settings, TokenStream, TypeCatalog, TypeRef, Value};

    #[test]
    fn raw_capture_reuses_buffers() {
        let catalog = TypeCatalog::new();
        let settings = Settings::new();
        let mut materializer = Materializer::new(&catalog, &settings);
        let ty = TypeRef::list(TypeRef::Raw);
        let mut reader = JsonReader::new(r#"[{"$id": "1", "a": [1, 2]}, "s", null]"#);
        let value = materializer.deserialize(&mut reader, Some(&ty)).unwrap();
        let items: Vec<String> = value
            .as_list()
            .unwrap()
            .to_vec()
            .into_iter()
            .map(|x| match x {
                Value::Raw(raw) => raw.into_string(),
                x => panic!("expected raw json, found {:?}", x),
            })
            .collect();
        assert_eq!(items, vec![r#"{"$id":"1","a":[1,2]}"#, r#""s""#, "null"]);
        assert_eq!(materializer.scratch.len(), 1);
        assert_eq!(reader.token(), &crate::Token::EndArray);
    }

    #[test]
    fn raw_capture_skips_leading_comments() {
        let catalog = TypeCatalog::new();
        let settings = Settings::new();
        let mut materializer = Materializer::new(&catalog, &settings);
        let mut reader = JsonReader::new("/* c */ // d\n [1, /* e */ 2]");
        let value = materializer
            .deserialize(&mut reader, Some(&TypeRef::Raw))
            .unwrap();
        match value {
            Value::Raw(raw) => assert_eq!(raw.into_string(), "[1/* e */,2]"),
            x => panic!("expected raw json, found {:?}", x),
        }
        assert_eq!(reader.token(), &crate::Token::EndArray);
    }

    #[test]
    fn tree_keeps_non_finite_floats_as_text() {
        let catalog = TypeCatalog::new();
        let settings = Settings::new();
        let mut materializer = Materializer::new(&catalog, &settings);
        let mut reader = JsonReader::new("[NaN, Infinity, -Infinity, 1.5]");
        let value = materializer
            .deserialize(&mut reader, Some(&TypeRef::Tree))
            .unwrap();
        assert_eq!(
            value,
            Value::Tree(serde_json::json!(["NaN", "Infinity", "-Infinity", 1.5]))
        );
    }

    #[test]
    fn tree_keeps_special_properties() {
        let catalog = TypeCatalog::new();
        let settings = Settings::new();
        let mut materializer = Materializer::new(&catalog, &settings);
        let mut reader = JsonReader::new(r#"{"$type": "Nope", "$ref": 1, "d": "\/Date(0)\/"}"#);
        let value = materializer
            .deserialize(&mut reader, Some(&TypeRef::Tree))
            .unwrap();
        assert_eq!(
            value,
            Value::Tree(serde_json::json!({"$type": "Nope", "$ref": 1, "d": "1970-01-01T00:00:00Z"}))
        );
    }
}
