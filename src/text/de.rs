use crate::{
    Describe, Error, FromValue, JsonReader, JsonTape, Materializer, Settings, TokenKind,
    TokenStream, TypeCatalog, TypeRef, Value,
};
use std::sync::Arc;

/// Deserializes JSON text into Rust types or materialized values.
///
/// The catalog is shared, so deserializers created from the same catalog
/// register each Rust type once.
///
/// ```
/// use graft::{JsonDeserializer, MissingMemberHandling, Settings};
/// use std::collections::HashMap;
///
/// let settings = Settings::new().with_missing_member_handling(MissingMemberHandling::Error);
/// let deserializer = JsonDeserializer::new().with_settings(settings);
/// let actual: HashMap<String, Vec<u16>> = deserializer.from_str(r#"{"a": [1, 2]}"#)?;
/// assert_eq!(actual["a"], vec![1, 2]);
/// # Ok::<(), graft::Error>(())
/// ```
#[derive(Debug, Default, Clone)]
pub struct JsonDeserializer {
    catalog: Arc<TypeCatalog>,
    settings: Settings,
}

impl JsonDeserializer {
    /// A deserializer with default settings and an empty catalog
    pub fn new() -> Self {
        JsonDeserializer::default()
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Use a catalog shared with other deserializers
    pub fn with_catalog(mut self, catalog: Arc<TypeCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn catalog(&self) -> &Arc<TypeCatalog> {
        &self.catalog
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Deserialize JSON text into a Rust type
    pub fn from_str<T>(&self, json: &str) -> Result<T, Error>
    where
        T: Describe + FromValue,
    {
        self.catalog.register_type::<T>()?;
        let value = self.value_from_str(json, Some(&T::type_ref()))?;
        T::from_value(value)
    }

    /// Deserialize a previously lexed document into a Rust type
    pub fn from_tape<T>(&self, tape: &JsonTape) -> Result<T, Error>
    where
        T: Describe + FromValue,
    {
        self.catalog.register_type::<T>()?;
        let mut stream = tape.stream();
        let value = self.materialize(&mut stream, Some(&T::type_ref()))?;
        T::from_value(value)
    }

    /// Materialize JSON text against the given target, or as a generic tree
    /// when there is none
    pub fn value_from_str(&self, json: &str, target: Option<&TypeRef>) -> Result<Value, Error> {
        let mut reader = JsonReader::new(json);
        self.materialize(&mut reader, target)
    }

    /// Read a JSON object or array into an existing object, map, or list
    pub fn populate_str(&self, json: &str, existing: &Value) -> Result<(), Error> {
        let mut reader = JsonReader::new(json);
        Materializer::new(&self.catalog, &self.settings).populate(&mut reader, existing)?;
        finish(&mut reader)
    }

    fn materialize<S: TokenStream>(&self, stream: &mut S, target: Option<&TypeRef>) -> Result<Value, Error> {
        let value = Materializer::new(&self.catalog, &self.settings).deserialize(stream, target)?;
        finish(stream)?;
        Ok(value)
    }
}

/// Only comments may follow the top level value
fn finish<S: TokenStream>(stream: &mut S) -> Result<(), Error> {
    while stream.advance()? {
        if stream.kind() != TokenKind::Comment {
            return Err(crate::de::unexpected(&*stream, "reading additional content"));
        }
    }

    Ok(())
}
