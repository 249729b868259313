use super::{advance_or_end, unexpected, Materializer};
use crate::{
    ConversionError, Error, ErrorKind, ListRef, MapKind, MapRef, Scalar, SequenceKind, Token,
    TokenKind, TokenStream, TypeRef, Value,
};

impl<'a> Materializer<'a> {
    /// Read the array at the current token. An existing list is appended to;
    /// otherwise a new sequence of the requested kind is built.
    pub(super) fn read_array(
        &mut self,
        stream: &mut dyn TokenStream,
        ty: &TypeRef,
        existing: Option<&Value>,
        id: Option<String>,
    ) -> Result<Value, Error> {
        if let Some(Value::List(list)) = existing {
            let item = list.borrow().item_type().clone();
            let value = Value::List(list.clone());
            self.register(id, &value)?;
            self.fill_list(stream, list, &item)?;
            return Ok(value);
        }

        let (kind, item) = match ty {
            TypeRef::Any => {
                let value = Value::Tree(self.capture_tree(stream)?);
                self.register(id, &value)?;
                return Ok(value);
            }
            TypeRef::Sequence(kind, item) => (*kind, item.as_ref()),
            _ => {
                return Err(Error::from(ConversionError::Unsupported {
                    from: String::from("array"),
                    to: ty.to_string(),
                }))
            }
        };

        match kind {
            SequenceKind::List | SequenceKind::Interface => {
                if kind == SequenceKind::Interface {
                    log::trace!("substituting a list for {}", ty);
                }

                let list = ListRef::new(SequenceKind::List, item.clone(), Vec::new());
                let value = Value::List(list.clone());
                self.register(id, &value)?;
                self.fill_list(stream, &list, item)?;
                Ok(value)
            }
            SequenceKind::FixedArray | SequenceKind::ReadOnly => {
                if id.is_some() {
                    return Err(Error::new(ErrorKind::NonReferenceableTarget { ty: ty.clone() }));
                }

                let mut items = Vec::new();
                self.read_items(stream, item, |x| items.push(x))?;
                Ok(Value::List(ListRef::new(kind, item.clone(), items)))
            }
        }
    }

    /// Append the items of the array at the current token to a list
    pub(super) fn fill_list(
        &mut self,
        stream: &mut dyn TokenStream,
        list: &ListRef,
        item: &TypeRef,
    ) -> Result<(), Error> {
        if !list.kind().is_growable() {
            return Err(Error::from(ConversionError::Unsupported {
                from: String::from("array"),
                to: TypeRef::Sequence(list.kind(), Box::new(item.clone())).to_string(),
            }));
        }

        self.read_items(stream, item, |x| {
            list.borrow_mut().push(x);
        })
    }

    fn read_items<F>(&mut self, stream: &mut dyn TokenStream, item: &TypeRef, mut sink: F) -> Result<(), Error>
    where
        F: FnMut(Value),
    {
        let mut idx = 0;
        loop {
            advance_or_end(stream, "deserializing an array")?;
            match stream.kind() {
                TokenKind::EndArray => return Ok(()),
                TokenKind::Comment => {}
                _ => {
                    let value = self
                        .create_value(stream, item, None, None)
                        .map_err(|e| e.at_index(idx))?;
                    sink(value);
                    idx += 1;
                }
            }
        }
    }

    /// Allocate a map for the object at the current position and fill it
    pub(super) fn read_map(
        &mut self,
        stream: &mut dyn TokenStream,
        ty: &TypeRef,
        existing: Option<&Value>,
        id: Option<String>,
    ) -> Result<Value, Error> {
        let map = match (existing, ty) {
            (Some(Value::Map(map)), _) => map.clone(),
            (_, TypeRef::Map(kind, key, value)) => {
                if *kind == MapKind::Interface {
                    log::trace!("substituting a concrete map for {}", ty);
                }
                MapRef::new(key.as_ref().clone(), value.as_ref().clone())
            }
            _ => {
                return Err(Error::from(ConversionError::Unsupported {
                    from: String::from("object"),
                    to: ty.to_string(),
                }))
            }
        };

        self.fill_map(stream, &map, id)?;
        Ok(Value::Map(map))
    }

    /// Read the remaining properties of an object into a map. The stream is
    /// positioned on the first property (or the end of the object).
    pub(super) fn fill_map(
        &mut self,
        stream: &mut dyn TokenStream,
        map: &MapRef,
        id: Option<String>,
    ) -> Result<(), Error> {
        self.register(id, &Value::Map(map.clone()))?;
        let (key_ty, value_ty) = {
            let inner = map.borrow();
            (inner.key_type().clone(), inner.value_type().clone())
        };

        loop {
            match stream.token() {
                Token::PropertyName(name) => {
                    let name = name.clone();
                    let key = self
                        .coerce_key(&name, &key_ty)
                        .map_err(|e| e.at_property(&name))?;
                    advance_or_end(stream, "reading a dictionary value")?;
                    let value = self
                        .create_value(stream, &value_ty, None, None)
                        .map_err(|e| e.at_property(&name))?;
                    map.insert(key, value);
                }
                Token::EndObject => return Ok(()),
                Token::Comment(_) => {}
                _ => return Err(unexpected(stream, "deserializing a dictionary")),
            }

            advance_or_end(stream, "deserializing a dictionary")?;
        }
    }

    fn coerce_key(&self, name: &str, ty: &TypeRef) -> Result<Scalar, Error> {
        match self.coerce(Scalar::String(name.to_string()), ty)? {
            Value::Scalar(key) => Ok(key),
            other => Err(Error::from(ConversionError::Unsupported {
                from: String::from(other.kind_name()),
                to: String::from("map key"),
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        EnumShape, ErrorCategory, ErrorKind, JsonReader, Materializer, Scalar, ScalarKind, SequenceKind,
        Settings, TypeCatalog, TypeRef, Value, MapKind,
    };

    fn read(catalog: &TypeCatalog, json: &str, ty: &TypeRef) -> Result<Value, crate::Error> {
        let settings = Settings::new();
        let mut reader = JsonReader::new(json);
        Materializer::new(catalog, &settings).deserialize(&mut reader, Some(ty))
    }

    #[test]
    fn interface_list_becomes_list() {
        let ty = TypeRef::Sequence(SequenceKind::Interface, Box::new(TypeRef::Scalar(ScalarKind::I32)));
        let value = read(&TypeCatalog::new(), "[1, /* two */ 2]", &ty).unwrap();
        let list = value.as_list().unwrap();
        assert_eq!(list.kind(), SequenceKind::List);
        assert_eq!(list.to_vec(), vec![Value::from(1i32), Value::from(2i32)]);
    }

    #[test]
    fn fixed_arrays_are_frozen() {
        let ty = TypeRef::array(TypeRef::Scalar(ScalarKind::String));
        let value = read(&TypeCatalog::new(), r#"["a", 1]"#, &ty).unwrap();
        let list = value.as_list().unwrap();
        assert_eq!(list.kind(), SequenceKind::FixedArray);
        assert_eq!(list.to_vec(), vec![Value::from("a"), Value::from("1")]);
        assert!(!value.is_reusable());
    }

    #[test]
    fn fixed_arrays_reject_ids() {
        let ty = TypeRef::array(TypeRef::Scalar(ScalarKind::I32));
        let err = read(&TypeCatalog::new(), r#"{"$id": "1", "$values": [1]}"#, &ty).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::NonReferenceableTarget { .. }));
        assert_eq!(err.category(), ErrorCategory::Reference);
    }

    #[test]
    fn item_errors_carry_index() {
        let ty = TypeRef::list(TypeRef::Scalar(ScalarKind::U8));
        let err = read(&TypeCatalog::new(), "[1, 2, 300]", &ty).unwrap_err();
        assert_eq!(err.path(), "$[2]");
        assert_eq!(err.category(), ErrorCategory::Conversion);
    }

    #[test]
    fn dictionary_keys_are_coerced() {
        let catalog = TypeCatalog::new();
        catalog.register(EnumShape::new("Color", [("Red", 0), ("Blue", 1)]));
        let ty = TypeRef::Map(
            MapKind::Interface,
            Box::new(TypeRef::named("Color")),
            Box::new(TypeRef::Scalar(ScalarKind::I64)),
        );
        let value = read(&catalog, r#"{"red": 1, /* c */ "1": 2, "Red": 3}"#, &ty).unwrap();
        let entries = value.as_map().unwrap().to_vec();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].1, Value::from(3i64));
        match &entries[1].0 {
            Scalar::Enum(x) => assert_eq!(x.name(), "Blue"),
            x => panic!("unexpected key {:?}", x),
        }
    }

    #[test]
    fn dictionary_errors_carry_key() {
        let ty = TypeRef::map(TypeRef::Scalar(ScalarKind::I32), TypeRef::Any);
        let err = read(&TypeCatalog::new(), r#"{"1": 1, "x": 2}"#, &ty).unwrap_err();
        assert_eq!(err.path(), "$.x");

        let ty = TypeRef::map(TypeRef::Scalar(ScalarKind::String), TypeRef::Scalar(ScalarKind::Bool));
        let err = read(&TypeCatalog::new(), r#"{"a": true, "b": [1]}"#, &ty).unwrap_err();
        assert_eq!(err.path(), "$.b");
    }

    #[test]
    fn array_into_map_fails() {
        let ty = TypeRef::map(TypeRef::Scalar(ScalarKind::String), TypeRef::Any);
        let err = read(&TypeCatalog::new(), "[]", &ty).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Conversion);
    }
}
