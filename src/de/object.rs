use super::{advance_or_end, read_text, unexpected, Materializer};
use crate::{
    Constructor, ConversionError, DefaultValueHandling, Error, ErrorKind, MemberMapping,
    MissingMemberHandling, NullValueHandling, ObjectRef, ObjectShape, Parameter, Token, TokenKind,
    TokenStream, TypeDescriptor, TypeNameHandling, TypeRef, Value,
};
use std::sync::Arc;

const REF_PROPERTY: &str = "$ref";
const TYPE_PROPERTY: &str = "$type";
const ID_PROPERTY: &str = "$id";
const VALUES_PROPERTY: &str = "$values";

/// How an object is going to be brought into existence
#[derive(Debug)]
pub(crate) enum ConstructionPlan<'s> {
    /// Read members into an instance the caller supplied
    PopulateExisting(ObjectRef),

    /// Allocate with the parameterless constructor, then read members
    DefaultConstructThenFill(&'s Constructor),

    /// Collect every member first, then pass matching ones to the constructor
    ParameterizedConstruct(&'s Constructor),
}

impl<'s> ConstructionPlan<'s> {
    pub(crate) fn select(shape: &'s ObjectShape, existing: Option<&Value>) -> Result<Self, Error> {
        if let Some(Value::Object(obj)) = existing {
            return Ok(ConstructionPlan::PopulateExisting(obj.clone()));
        }

        if shape.is_abstract() {
            return Err(Error::new(ErrorKind::AbstractType {
                ty: shape.name().clone(),
            }));
        }

        if let Some(ctor) = shape.default_constructor() {
            return Ok(ConstructionPlan::DefaultConstructThenFill(ctor));
        }

        let mut candidates = shape.parameterized_constructors();
        match (candidates.next(), candidates.count()) {
            (None, _) => Err(Error::new(ErrorKind::NoConstructor {
                ty: shape.name().clone(),
            })),
            (Some(ctor), 0) => Ok(ConstructionPlan::ParameterizedConstruct(ctor)),
            (Some(_), rest) => Err(Error::new(ErrorKind::AmbiguousConstructor {
                ty: shape.name().clone(),
                candidates: rest + 1,
            })),
        }
    }
}

/// Required members observed with a non-null value
struct RequiredTracker {
    seen: Vec<bool>,
}

impl RequiredTracker {
    fn new(shape: &ObjectShape) -> Self {
        RequiredTracker {
            seen: vec![false; shape.members().len()],
        }
    }

    fn observe(&mut self, idx: Option<usize>, kind: TokenKind) {
        if let Some(idx) = idx {
            if kind != TokenKind::Null {
                self.seen[idx] = true;
            }
        }
    }

    fn check(&self, shape: &ObjectShape) -> Result<(), Error> {
        let missing = shape
            .members()
            .iter()
            .zip(&self.seen)
            .find(|(member, seen)| member.is_required() && !member.is_ignored() && !**seen);

        match missing {
            Some((member, _)) => Err(Error::new(ErrorKind::MissingRequiredMember {
                member: member.property_name().to_string(),
                ty: shape.name().clone(),
            })),
            None => Ok(()),
        }
    }
}

impl<'a> Materializer<'a> {
    /// The object protocol: consume special properties, then dispatch on
    /// the (possibly narrowed) target
    pub(super) fn read_object(
        &mut self,
        stream: &mut dyn TokenStream,
        ty: &TypeRef,
        existing: Option<&Value>,
    ) -> Result<Value, Error> {
        advance_or_end(stream, "deserializing an object")?;

        let mut target = ty.clone();
        let mut id: Option<String> = None;
        loop {
            let name = match stream.token() {
                Token::PropertyName(name) => name.as_str(),
                Token::Comment(_) => {
                    advance_or_end(stream, "deserializing an object")?;
                    continue;
                }
                _ => break,
            };

            match name {
                REF_PROPERTY => {
                    advance_or_end(stream, "reading a reference")?;
                    let reference = read_text(stream, "reading a reference")?;
                    self.expect_end_object(stream, "reading a reference")?;
                    return self.resolve(&reference);
                }
                TYPE_PROPERTY => {
                    advance_or_end(stream, "reading a type name")?;
                    let qualified = read_text(stream, "reading a type name")?;
                    advance_or_end(stream, "deserializing an object")?;
                    if self.settings.type_name_handling() != TypeNameHandling::None {
                        target = self.narrow(&target, &qualified)?;
                    }
                }
                ID_PROPERTY => {
                    advance_or_end(stream, "reading an id")?;
                    id = Some(read_text(stream, "reading an id")?);
                    advance_or_end(stream, "deserializing an object")?;
                }
                VALUES_PROPERTY => {
                    advance_or_end(stream, "reading array values")?;
                    let list = self
                        .read_array(stream, &target, existing, id)
                        .map_err(|e| e.at_property(VALUES_PROPERTY))?;
                    self.expect_end_object(stream, "reading array values")?;
                    return Ok(list);
                }
                _ => break,
            }
        }

        match &target {
            TypeRef::Any => {
                let value = Value::Tree(self.capture_tree_fields(stream)?);
                self.register(id, &value)?;
                Ok(value)
            }
            TypeRef::Map(..) => self.read_map(stream, &target, existing, id),
            TypeRef::Named(name) => {
                let shape = match self.catalog.descriptor(name)? {
                    TypeDescriptor::Object(shape) => shape,
                    TypeDescriptor::Enum(_) => return Err(object_into(&target)),
                };
                self.read_into_shape(stream, shape, existing, id)
            }
            _ => Err(object_into(&target)),
        }
    }

    /// Resolve a `$type` and check it can stand in for the requested type
    fn narrow(&self, requested: &TypeRef, qualified: &str) -> Result<TypeRef, Error> {
        let bound = match (requested, self.catalog.bind(qualified)) {
            (_, Ok(name)) => name,
            (TypeRef::Sequence(..) | TypeRef::Map(..), Err(_)) => {
                log::trace!("ignoring unbound type {} on {}", qualified, requested);
                return Ok(requested.clone());
            }
            (_, Err(e)) => return Err(e),
        };

        if !self.catalog.is_assignable(requested, &bound) {
            return Err(Error::new(ErrorKind::TypeMismatch {
                specified: bound,
                requested: requested.clone(),
            }));
        }

        log::debug!("narrowed {} to {}", requested, bound);
        Ok(TypeRef::Named(bound))
    }

    /// Advance past the value just read and require the object to end
    fn expect_end_object(&mut self, stream: &mut dyn TokenStream, context: &'static str) -> Result<(), Error> {
        loop {
            advance_or_end(stream, context)?;
            match stream.kind() {
                TokenKind::EndObject => return Ok(()),
                TokenKind::Comment => {}
                _ => return Err(unexpected(stream, context)),
            }
        }
    }

    fn read_into_shape(
        &mut self,
        stream: &mut dyn TokenStream,
        shape: Arc<ObjectShape>,
        existing: Option<&Value>,
        id: Option<String>,
    ) -> Result<Value, Error> {
        let plan = ConstructionPlan::select(&shape, existing)?;
        log::trace!("{} via {:?}", shape.name(), plan);
        match plan {
            ConstructionPlan::PopulateExisting(obj) => {
                let own = self.catalog.object_shape(&obj.type_name())?;
                self.fill_object(stream, &obj, &own, id)?;
                Ok(Value::Object(obj))
            }
            ConstructionPlan::DefaultConstructThenFill(ctor) => {
                let obj = ObjectRef::new(ctor.invoke(Vec::new())?);
                self.fill_object(stream, &obj, &shape, id)?;
                Ok(Value::Object(obj))
            }
            ConstructionPlan::ParameterizedConstruct(ctor) => {
                self.construct(stream, &shape, ctor, id).map(Value::Object)
            }
        }
    }

    /// Member fill: read the remaining properties of an object into an
    /// instance. The stream is positioned on the first property.
    pub(super) fn fill_object(
        &mut self,
        stream: &mut dyn TokenStream,
        obj: &ObjectRef,
        shape: &ObjectShape,
        id: Option<String>,
    ) -> Result<(), Error> {
        self.register(id, &Value::Object(obj.clone()))?;
        let mut required = RequiredTracker::new(shape);
        loop {
            match stream.token() {
                Token::PropertyName(name) => {
                    let name = name.clone();
                    advance_to_value(stream)?;
                    let idx = shape.members().position(&name);
                    required.observe(idx, stream.kind());
                    self.set_member(stream, obj, shape, &name, idx)
                        .map_err(|e| e.at_property(&name))?;
                }
                Token::EndObject => return required.check(shape),
                Token::Comment(_) => {}
                _ => return Err(unexpected(stream, "deserializing an object")),
            }

            advance_or_end(stream, "deserializing an object")?;
        }
    }

    fn set_member(
        &mut self,
        stream: &mut dyn TokenStream,
        obj: &ObjectRef,
        shape: &ObjectShape,
        name: &str,
        idx: Option<usize>,
    ) -> Result<(), Error> {
        let mapping = match idx.and_then(|x| shape.members().get_index(x)) {
            Some(mapping) => mapping,
            None => return self.skip_unknown(stream, shape, name),
        };

        if mapping.is_ignored() {
            return stream.skip_subtree();
        }

        // a member converter owns the subtree, so there is nothing to reuse
        let mut current = None;
        if self.settings.reuses_existing()
            && mapping.converter().is_none()
            && matches!(stream.kind(), TokenKind::StartObject | TokenKind::StartArray)
        {
            current = obj
                .get(mapping.member_name())
                .filter(|x| x.is_reusable());
        }

        if !mapping.is_writable() && current.is_none() {
            return stream.skip_subtree();
        }

        let value = self.create_value(stream, mapping.ty(), current.as_ref(), mapping.converter())?;
        // a `$ref` or a value of another kind replaces the current instance
        let replaced = current.map_or(true, |x| !value.same_instance(&x));
        if replaced && self.should_set(mapping, &value) {
            obj.set(mapping.member_name(), value);
        }

        Ok(())
    }

    fn skip_unknown(&mut self, stream: &mut dyn TokenStream, shape: &ObjectShape, name: &str) -> Result<(), Error> {
        match self.settings.missing_member_handling() {
            MissingMemberHandling::Error => Err(Error::new(ErrorKind::UnknownMember {
                member: name.to_string(),
                ty: shape.name().clone(),
            })),
            MissingMemberHandling::Ignore => stream.skip_subtree(),
        }
    }

    /// Whether a materialized value is written to its member
    fn should_set(&self, mapping: &MemberMapping, value: &Value) -> bool {
        let nulls = mapping
            .null_value_handling()
            .unwrap_or_else(|| self.settings.null_value_handling());
        if nulls == NullValueHandling::Ignore && value.is_null() {
            return false;
        }

        let defaults = mapping
            .default_value_handling()
            .unwrap_or_else(|| self.settings.default_value_handling());
        if defaults == DefaultValueHandling::Ignore {
            let is_default = match mapping.default_value() {
                Some(default) => value.as_scalar() == Some(default),
                None => value.is_null(),
            };

            if is_default {
                return false;
            }
        }

        mapping.is_writable()
    }

    /// Parameterized construction. Every property is read first; values
    /// whose property matches a parameter name feed the constructor and the
    /// rest are written to the new instance afterwards.
    fn construct(
        &mut self,
        stream: &mut dyn TokenStream,
        shape: &ObjectShape,
        ctor: &Constructor,
        id: Option<String>,
    ) -> Result<ObjectRef, Error> {
        let mut required = RequiredTracker::new(shape);
        let mut values: Vec<(usize, Value)> = Vec::new();
        loop {
            match stream.token() {
                Token::PropertyName(name) => {
                    let name = name.clone();
                    advance_to_value(stream)?;
                    let idx = shape.members().position(&name);
                    required.observe(idx, stream.kind());
                    let (idx, mapping) = match idx.and_then(|x| shape.members().get_index(x).map(|m| (x, m))) {
                        Some(found) => found,
                        None => {
                            self.skip_unknown(stream, shape, &name)
                                .map_err(|e| e.at_property(&name))?;
                            advance_or_end(stream, "deserializing an object")?;
                            continue;
                        }
                    };

                    if mapping.is_ignored() {
                        stream.skip_subtree()?;
                    } else {
                        let value = self
                            .create_value(stream, mapping.ty(), None, mapping.converter())
                            .map_err(|e| e.at_property(&name))?;
                        values.retain(|(x, _)| *x != idx);
                        values.push((idx, value));
                    }
                }
                Token::EndObject => break,
                Token::Comment(_) => {}
                _ => return Err(unexpected(stream, "deserializing an object")),
            }

            advance_or_end(stream, "deserializing an object")?;
        }

        required.check(shape)?;

        let params = ctor.params();
        let mut args = vec![Value::Null; params.len()];
        let mut remainder = Vec::new();
        for (idx, value) in values {
            let mapping = match shape.members().get_index(idx) {
                Some(mapping) => mapping,
                None => continue,
            };

            match find_parameter(params, mapping.property_name()) {
                Some(param) => args[param] = value,
                None => remainder.push((mapping, value)),
            }
        }

        let obj = ObjectRef::new(ctor.invoke(args)?);
        self.register(id, &Value::Object(obj.clone()))?;
        for (mapping, value) in remainder {
            if self.should_set(mapping, &value) {
                obj.set(mapping.member_name(), value);
            }
        }

        Ok(obj)
    }
}

/// Move from a property name to its value, past any comments
fn advance_to_value(stream: &mut dyn TokenStream) -> Result<(), Error> {
    loop {
        advance_or_end(stream, "setting a member value")?;
        if stream.kind() != TokenKind::Comment {
            return Ok(());
        }
    }
}

/// Match a property to a constructor parameter: exact name first, then
/// ignoring case
fn find_parameter(params: &[Parameter], property: &str) -> Option<usize> {
    params
        .iter()
        .position(|x| x.name() == property)
        .or_else(|| params.iter().position(|x| x.name().eq_ignore_ascii_case(property)))
}

fn object_into(target: &TypeRef) -> Error {
    Error::from(ConversionError::Unsupported {
        from: String::from("object"),
        to: target.to_string(),
    })
}
