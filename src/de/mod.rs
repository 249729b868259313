//! Materialization of token streams into values
//!
//! The [`Materializer`] looks at the current token, dispatches on its kind
//! and the requested type, and recurses into nested values through the same
//! entry point. Every call consumes exactly the subtree of the value it
//! returns and leaves the stream on that subtree's last token.

mod capture;
mod collection;
mod object;

use crate::{
    Converter, Error, ErrorKind, ReferenceResolver, ReferenceTable, Scalar, Settings, Token,
    TokenKind, TokenStream, TypeCatalog, TypeDescriptor, TypeRef, Value,
};
use std::sync::Arc;

enum References<'a> {
    Owned(ReferenceTable),
    Borrowed(&'a mut dyn ReferenceResolver),
}

impl References<'_> {
    fn resolver(&mut self) -> &mut dyn ReferenceResolver {
        match self {
            References::Owned(x) => x,
            References::Borrowed(x) => &mut **x,
        }
    }
}

/// Turns token streams into values according to a type catalog and
/// settings.
///
/// ```
/// use graft::{JsonReader, Materializer, Scalar, ScalarKind, Settings, TypeCatalog, TypeRef, Value};
///
/// let catalog = TypeCatalog::new();
/// let settings = Settings::new();
/// let mut materializer = Materializer::new(&catalog, &settings);
///
/// let mut reader = JsonReader::new(r#"["1", 2, 3.0]"#);
/// let target = TypeRef::list(TypeRef::Scalar(ScalarKind::U8));
/// let value = materializer.deserialize(&mut reader, Some(&target))?;
/// let items = value.as_list().unwrap().to_vec();
/// assert_eq!(items, vec![Value::from(1u8), Value::from(2u8), Value::from(3u8)]);
/// # Ok::<(), graft::Error>(())
/// ```
pub struct Materializer<'a> {
    catalog: &'a TypeCatalog,
    settings: &'a Settings,
    references: References<'a>,
    depth: usize,
    scratch: Vec<String>,
}

impl<'a> Materializer<'a> {
    /// A materializer that tracks references per top level call
    pub fn new(catalog: &'a TypeCatalog, settings: &'a Settings) -> Self {
        Materializer {
            catalog,
            settings,
            references: References::Owned(ReferenceTable::new()),
            depth: 0,
            scratch: Vec::new(),
        }
    }

    /// A materializer that registers and resolves references through the
    /// caller's resolver, so references can span several calls
    pub fn with_resolver(
        catalog: &'a TypeCatalog,
        settings: &'a Settings,
        resolver: &'a mut dyn ReferenceResolver,
    ) -> Self {
        Materializer {
            catalog,
            settings,
            references: References::Borrowed(resolver),
            depth: 0,
            scratch: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &'a TypeCatalog {
        self.catalog
    }

    pub fn settings(&self) -> &'a Settings {
        self.settings
    }

    /// Materialize the next value of the stream. Without a target, objects
    /// and arrays become generic trees. A stream that has no more tokens
    /// yields `Null`.
    pub fn deserialize<S>(&mut self, stream: &mut S, target: Option<&TypeRef>) -> Result<Value, Error>
    where
        S: TokenStream,
    {
        if let References::Owned(table) = &mut self.references {
            table.clear();
        }

        if stream.kind() == TokenKind::None && !stream.advance()? {
            return Ok(Value::Null);
        }

        let target = target.unwrap_or(&TypeRef::Any);
        self.create_value(stream, target, None, None)
    }

    /// Read the next object or array of the stream into an existing object,
    /// map, or list
    pub fn populate<S>(&mut self, stream: &mut S, existing: &Value) -> Result<(), Error>
    where
        S: TokenStream,
    {
        if let References::Owned(table) = &mut self.references {
            table.clear();
        }

        if stream.kind() == TokenKind::None && !stream.advance()? {
            return Ok(());
        }

        self.populate_value(stream, existing)
    }

    fn populate_value(&mut self, stream: &mut dyn TokenStream, existing: &Value) -> Result<(), Error> {
        match (stream.kind(), existing) {
            (TokenKind::StartArray, Value::List(list)) => {
                let item = list.borrow().item_type().clone();
                self.fill_list(stream, list, &item)
            }
            (TokenKind::StartObject, Value::Object(_) | Value::Map(_)) => {
                advance_or_end(stream, "populating an object")?;

                let mut id = None;
                if matches!(stream.token(), Token::PropertyName(name) if name == "$id") {
                    advance_or_end(stream, "reading an id")?;
                    id = Some(read_text(stream, "reading an id")?);
                    advance_or_end(stream, "populating an object")?;
                }

                match existing {
                    Value::Map(map) => self.fill_map(stream, map, id),
                    Value::Object(obj) => {
                        let shape = self.catalog.object_shape(&obj.type_name())?;
                        self.fill_object(stream, obj, &shape, id)
                    }
                    _ => Ok(()),
                }
            }
            (TokenKind::StartArray | TokenKind::StartObject, _) => Err(Error::from(
                crate::ConversionError::Unsupported {
                    from: String::from(if stream.kind() == TokenKind::StartArray { "array" } else { "object" }),
                    to: String::from(existing.kind_name()),
                },
            )),
            (token, _) => Err(Error::new(ErrorKind::UnexpectedToken {
                token,
                context: "populating a value",
                depth: stream.depth(),
            })),
        }
    }

    fn register(&mut self, id: Option<String>, value: &Value) -> Result<(), Error> {
        match id {
            Some(id) => self.references.resolver().add_reference(&id, value.clone()),
            None => Ok(()),
        }
    }

    fn resolve(&mut self, id: &str) -> Result<Value, Error> {
        self.references.resolver().resolve_reference(id)
    }

    /// Dispatch on the current token and requested type
    pub(crate) fn create_value(
        &mut self,
        stream: &mut dyn TokenStream,
        ty: &TypeRef,
        existing: Option<&Value>,
        member_converter: Option<&Arc<dyn Converter>>,
    ) -> Result<Value, Error> {
        if self.depth >= self.settings.max_depth() {
            return Err(Error::new(ErrorKind::DepthLimit {
                limit: self.settings.max_depth(),
            }));
        }

        self.depth += 1;
        let result = self.create_value_inner(stream, ty, existing, member_converter);
        self.depth -= 1;
        result
    }

    fn create_value_inner(
        &mut self,
        stream: &mut dyn TokenStream,
        ty: &TypeRef,
        existing: Option<&Value>,
        member_converter: Option<&Arc<dyn Converter>>,
    ) -> Result<Value, Error> {
        if let Some(converter) = member_converter {
            log::trace!("member converter {} reads {}", converter.name(), ty);
            return converter.read_json(stream, ty, &mut Nested { inner: self });
        }

        if let Some(converter) = self.type_converter(ty) {
            log::trace!("converter {} reads {}", converter.name(), ty);
            return converter.read_json(stream, ty, &mut Nested { inner: self });
        }

        match ty {
            TypeRef::Raw => return self.capture_raw(stream).map(Value::Raw),
            TypeRef::Tree => return self.capture_tree(stream).map(Value::Tree),
            _ => {}
        }

        loop {
            match stream.token() {
                Token::StartObject => return self.read_object(stream, ty, existing),
                Token::StartArray => return self.read_array(stream, ty, existing, None),
                Token::StartConstructor(name) => {
                    let name = name.clone();
                    stream.skip_subtree()?;
                    return Ok(Value::from(name));
                }
                Token::EndConstructor(name) => return Ok(Value::from(name.as_str())),
                Token::Null | Token::Undefined => {
                    return Ok(if *ty == TypeRef::DbNull { Value::DbNull } else { Value::Null });
                }
                Token::Comment(_) => {
                    if !stream.advance()? {
                        break;
                    }
                }
                Token::None => break,
                token => match token.scalar() {
                    Some(scalar) => return self.coerce(scalar, ty),
                    None => {
                        return Err(Error::new(ErrorKind::UnexpectedToken {
                            token: token.kind(),
                            context: "deserializing a value",
                            depth: stream.depth(),
                        }))
                    }
                },
            }
        }

        Err(Error::new(ErrorKind::UnexpectedEnd {
            context: "deserializing a value",
        }))
    }

    /// The class level converter of a named type, or else the first catalog
    /// converter that accepts the type
    fn type_converter(&self, ty: &TypeRef) -> Option<Arc<dyn Converter>> {
        if let TypeRef::Any = ty {
            return None;
        }

        if let TypeRef::Named(name) = ty {
            if let Ok(TypeDescriptor::Object(shape)) = self.catalog.descriptor(name) {
                if let Some(converter) = shape.converter() {
                    return Some(converter.clone());
                }
            }
        }

        self.catalog.matching_converter(ty)
    }

    /// Convert a decoded scalar into the requested type
    fn coerce(&self, scalar: Scalar, ty: &TypeRef) -> Result<Value, Error> {
        let unsupported = |scalar: &Scalar| {
            Error::from(crate::ConversionError::Unsupported {
                from: scalar.type_name(),
                to: ty.to_string(),
            })
        };

        match ty {
            TypeRef::Any => Ok(Value::Scalar(scalar)),
            TypeRef::Scalar(kind) => Ok(Value::Scalar(scalar.convert(*kind)?)),
            TypeRef::Named(name) => match self.catalog.descriptor(name)? {
                TypeDescriptor::Enum(shape) => Ok(Value::Scalar(scalar.to_enum(&shape)?)),
                TypeDescriptor::Object(_) => Err(unsupported(&scalar)),
            },
            _ => Err(unsupported(&scalar)),
        }
    }
}

/// A materializer handle passed to converters for reading nested values
pub struct Nested<'m, 'a> {
    inner: &'m mut Materializer<'a>,
}

impl<'m, 'a> Nested<'m, 'a> {
    /// Materialize the value at the stream's current token with the full
    /// dispatch, including converters
    pub fn deserialize(&mut self, stream: &mut dyn TokenStream, ty: &TypeRef) -> Result<Value, Error> {
        self.inner.create_value(stream, ty, None, None)
    }

    /// Read the object or array at the stream's current token into an
    /// existing value
    pub fn populate(&mut self, stream: &mut dyn TokenStream, existing: &Value) -> Result<(), Error> {
        self.inner.populate_value(stream, existing)
    }

    pub fn catalog(&self) -> &'a TypeCatalog {
        self.inner.catalog
    }

    pub fn settings(&self) -> &'a Settings {
        self.inner.settings
    }
}

/// Move to the next token, failing when the stream runs out
pub(crate) fn advance_or_end(stream: &mut dyn TokenStream, context: &'static str) -> Result<(), Error> {
    if stream.advance()? {
        Ok(())
    } else {
        Err(Error::new(ErrorKind::UnexpectedEnd { context }))
    }
}

/// The current token's value as text, for metadata such as `$id`
pub(crate) fn read_text(stream: &dyn TokenStream, context: &'static str) -> Result<String, Error> {
    stream.token().as_text().ok_or_else(|| {
        Error::new(ErrorKind::UnexpectedToken {
            token: stream.kind(),
            context,
            depth: stream.depth(),
        })
    })
}

pub(crate) fn unexpected(stream: &dyn TokenStream, context: &'static str) -> Error {
    match stream.kind() {
        TokenKind::None => Error::new(ErrorKind::UnexpectedEnd { context }),
        token => Error::new(ErrorKind::UnexpectedToken {
            token,
            context,
            depth: stream.depth(),
        }),
    }
}
