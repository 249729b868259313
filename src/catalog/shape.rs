use super::mapping::{MemberMapping, MemberMappingSet};
use super::Converter;
use crate::{EnumValue, Error, ErrorKind, Instance, ScalarKind, Value};
use std::fmt;
use std::sync::Arc;

/// The registered name of an object or enum type
pub type TypeName = Arc<str>;

/// What kind of sequence a [`TypeRef::Sequence`] denotes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceKind {
    /// A growable list
    List,

    /// A bare list interface. Materialized as a [`SequenceKind::List`].
    Interface,

    /// A fixed size array. Built in full then frozen; cannot carry an `$id`
    /// and is never populated in place.
    FixedArray,

    /// A read-only view. Same restrictions as a fixed array.
    ReadOnly,
}

impl SequenceKind {
    /// Whether items can be appended after construction
    pub fn is_growable(self) -> bool {
        matches!(self, SequenceKind::List | SequenceKind::Interface)
    }
}

/// What kind of map a [`TypeRef::Map`] denotes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapKind {
    /// A concrete map
    Concrete,

    /// A bare map interface. Materialized as a [`MapKind::Concrete`] map.
    Interface,
}

/// A materialization target.
///
/// ```
/// use graft::{ScalarKind, TypeRef};
///
/// let ty = TypeRef::list(TypeRef::map(TypeRef::Scalar(ScalarKind::String), TypeRef::named("Order")));
/// assert_eq!(ty.to_string(), "List<Map<string, Order>>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// No static type. The shape is inferred from the data, yielding a
    /// generic tree for objects and arrays.
    Any,

    /// A primitive
    Scalar(ScalarKind),

    /// A registered object or enum type
    Named(TypeName),

    /// A sequence of items of the inner type
    Sequence(SequenceKind, Box<TypeRef>),

    /// A map from keys of the first type to values of the second
    Map(MapKind, Box<TypeRef>, Box<TypeRef>),

    /// The subtree captured verbatim as JSON text
    Raw,

    /// A database null sentinel. A null token materializes as
    /// [`Value::DbNull`] instead of [`Value::Null`].
    DbNull,

    /// A loosely typed tree (`serde_json::Value`). Special properties are
    /// not interpreted.
    Tree,
}

impl TypeRef {
    /// A reference to a registered type
    pub fn named(name: &str) -> TypeRef {
        TypeRef::Named(TypeName::from(name))
    }

    /// A growable list of the given item type
    pub fn list(item: TypeRef) -> TypeRef {
        TypeRef::Sequence(SequenceKind::List, Box::new(item))
    }

    /// A fixed size array of the given item type
    pub fn array(item: TypeRef) -> TypeRef {
        TypeRef::Sequence(SequenceKind::FixedArray, Box::new(item))
    }

    /// A concrete map
    pub fn map(key: TypeRef, value: TypeRef) -> TypeRef {
        TypeRef::Map(MapKind::Concrete, Box::new(key), Box::new(value))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Any => f.write_str("any"),
            TypeRef::Scalar(kind) => write!(f, "{}", kind),
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::Sequence(SequenceKind::List, item) => write!(f, "List<{}>", item),
            TypeRef::Sequence(SequenceKind::Interface, item) => write!(f, "IList<{}>", item),
            TypeRef::Sequence(SequenceKind::FixedArray, item) => write!(f, "{}[]", item),
            TypeRef::Sequence(SequenceKind::ReadOnly, item) => write!(f, "ReadOnlyList<{}>", item),
            TypeRef::Map(MapKind::Concrete, key, value) => write!(f, "Map<{}, {}>", key, value),
            TypeRef::Map(MapKind::Interface, key, value) => write!(f, "IMap<{}, {}>", key, value),
            TypeRef::Raw => f.write_str("raw"),
            TypeRef::DbNull => f.write_str("dbnull"),
            TypeRef::Tree => f.write_str("tree"),
        }
    }
}

type Factory = dyn Fn(Vec<Value>) -> Result<Instance, Error> + Send + Sync;

/// A named constructor parameter and the member it initializes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    name: String,
    member: String,
}

impl Parameter {
    /// A parameter initializing the member of the same name
    pub fn new(name: &str) -> Self {
        Parameter {
            name: name.to_string(),
            member: name.to_string(),
        }
    }

    /// Set the member that [`Constructor::assigning`] writes this parameter to
    pub fn assigns(mut self, member: &str) -> Self {
        self.member = member.to_string();
        self
    }

    /// The parameter name, matched case-insensitively against property names
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The member this parameter initializes
    pub fn member(&self) -> &str {
        &self.member
    }
}

/// An accessible way of allocating an instance
#[derive(Clone)]
pub struct Constructor {
    params: Vec<Parameter>,
    factory: Arc<Factory>,
}

impl Constructor {
    /// A constructor with explicit parameters and body. The body receives one
    /// value per parameter, in declaration order.
    pub fn new<F>(params: Vec<Parameter>, factory: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Instance, Error> + Send + Sync + 'static,
    {
        Constructor {
            params,
            factory: Arc::new(factory),
        }
    }

    /// A parameterless constructor producing an instance with no members set
    pub fn parameterless(ty: &str) -> Self {
        let ty = TypeName::from(ty);
        Constructor::new(Vec::new(), move |_| Ok(Instance::new(ty.clone())))
    }

    /// A parameterless constructor that initializes members, for example to
    /// give a collection member an empty list that later gets populated in
    /// place
    pub fn parameterless_with<F>(ty: &str, init: F) -> Self
    where
        F: Fn(&mut Instance) + Send + Sync + 'static,
    {
        let ty = TypeName::from(ty);
        Constructor::new(Vec::new(), move |_| {
            let mut instance = Instance::new(ty.clone());
            init(&mut instance);
            Ok(instance)
        })
    }

    /// A constructor that writes each argument to the parameter's member
    pub fn assigning(ty: &str, params: Vec<Parameter>) -> Self {
        let ty = TypeName::from(ty);
        let members: Vec<String> = params.iter().map(|x| x.member.clone()).collect();
        Constructor::new(params, move |args| {
            let mut instance = Instance::new(ty.clone());
            for (member, value) in members.iter().zip(args) {
                instance.set(member, value);
            }
            Ok(instance)
        })
    }

    /// The declared parameters
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    /// Whether the constructor takes no arguments
    pub fn is_parameterless(&self) -> bool {
        self.params.is_empty()
    }

    pub(crate) fn invoke(&self, args: Vec<Value>) -> Result<Instance, Error> {
        (self.factory)(args)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("params", &self.params)
            .finish()
    }
}

/// Static description of an object type: its members, constructors, and
/// place in the type hierarchy
#[derive(Clone)]
pub struct ObjectShape {
    name: TypeName,
    assembly: Option<TypeName>,
    base: Option<TypeName>,
    interfaces: Vec<TypeName>,
    is_abstract: bool,
    constructors: Vec<Constructor>,
    members: MemberMappingSet,
    converter: Option<Arc<dyn Converter>>,
}

impl ObjectShape {
    /// Start describing an object type
    pub fn builder(name: &str) -> ObjectShapeBuilder {
        ObjectShapeBuilder {
            shape: ObjectShape {
                name: TypeName::from(name),
                assembly: None,
                base: None,
                interfaces: Vec::new(),
                is_abstract: false,
                constructors: Vec::new(),
                members: MemberMappingSet::default(),
                converter: None,
            },
            members: Vec::new(),
        }
    }

    pub fn name(&self) -> &TypeName {
        &self.name
    }

    /// The assembly (module) label a binder may match on
    pub fn assembly(&self) -> Option<&TypeName> {
        self.assembly.as_ref()
    }

    pub fn base(&self) -> Option<&TypeName> {
        self.base.as_ref()
    }

    pub fn interfaces(&self) -> &[TypeName] {
        &self.interfaces
    }

    /// Interfaces and abstract types can't be instantiated
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn members(&self) -> &MemberMappingSet {
        &self.members
    }

    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    /// The class-level converter, which takes precedence over catalog converters
    pub fn converter(&self) -> Option<&Arc<dyn Converter>> {
        self.converter.as_ref()
    }

    pub fn default_constructor(&self) -> Option<&Constructor> {
        self.constructors.iter().find(|x| x.is_parameterless())
    }

    pub fn parameterized_constructors(&self) -> impl Iterator<Item = &Constructor> {
        self.constructors.iter().filter(|x| !x.is_parameterless())
    }
}

impl fmt::Debug for ObjectShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectShape")
            .field("name", &self.name)
            .field("base", &self.base)
            .field("interfaces", &self.interfaces)
            .field("is_abstract", &self.is_abstract)
            .field("constructors", &self.constructors)
            .field("members", &self.members)
            .field("converter", &self.converter.is_some())
            .finish()
    }
}

/// Incrementally describes an [`ObjectShape`]
///
/// ```
/// use graft::{Constructor, MemberMapping, ObjectShape, ScalarKind, TypeRef};
///
/// let shape = ObjectShape::builder("Person")
///     .default_constructor()
///     .member(MemberMapping::new("name", TypeRef::Scalar(ScalarKind::String)).required())
///     .member(MemberMapping::new("age", TypeRef::Scalar(ScalarKind::U8)))
///     .build()?;
/// assert_eq!(shape.members().len(), 2);
/// # Ok::<(), graft::Error>(())
/// ```
pub struct ObjectShapeBuilder {
    shape: ObjectShape,
    members: Vec<MemberMapping>,
}

impl ObjectShapeBuilder {
    pub fn assembly(mut self, assembly: &str) -> Self {
        self.shape.assembly = Some(TypeName::from(assembly));
        self
    }

    /// The direct base type
    pub fn base(mut self, base: &str) -> Self {
        self.shape.base = Some(TypeName::from(base));
        self
    }

    pub fn implements(mut self, interface: &str) -> Self {
        self.shape.interfaces.push(TypeName::from(interface));
        self
    }

    /// Mark the type as abstract (or an interface)
    pub fn abstract_type(mut self) -> Self {
        self.shape.is_abstract = true;
        self
    }

    /// Add a parameterless constructor producing an empty instance
    pub fn default_constructor(self) -> Self {
        let ctor = Constructor::parameterless(&self.shape.name);
        self.constructor(ctor)
    }

    pub fn constructor(mut self, ctor: Constructor) -> Self {
        self.shape.constructors.push(ctor);
        self
    }

    pub fn member(mut self, member: MemberMapping) -> Self {
        self.members.push(member);
        self
    }

    pub fn converter(mut self, converter: Arc<dyn Converter>) -> Self {
        self.shape.converter = Some(converter);
        self
    }

    /// Validate and finish the shape. Property names must be unique and
    /// member converters must support their member's type.
    pub fn build(self) -> Result<ObjectShape, Error> {
        let mut shape = self.shape;
        for member in self.members {
            if let Some(converter) = member.converter() {
                if !converter.can_convert(member.ty()) {
                    return Err(Error::new(ErrorKind::IncompatibleConverter {
                        member: member.property_name().to_string(),
                        ty: member.ty().clone(),
                    }));
                }
            }

            let property = member.property_name().to_string();
            if !shape.members.insert(member) {
                return Err(Error::new(ErrorKind::DuplicateMember {
                    member: property,
                    ty: shape.name.clone(),
                }));
            }
        }

        Ok(shape)
    }
}

/// Static description of an enum type
#[derive(Debug, Clone)]
pub struct EnumShape {
    name: TypeName,
    variants: Vec<(TypeName, i64)>,
}

impl EnumShape {
    pub fn new<'a, I>(name: &str, variants: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, i64)>,
    {
        EnumShape {
            name: TypeName::from(name),
            variants: variants
                .into_iter()
                .map(|(name, ordinal)| (TypeName::from(name), ordinal))
                .collect(),
        }
    }

    pub fn name(&self) -> &TypeName {
        &self.name
    }

    pub fn variants(&self) -> impl Iterator<Item = (&str, i64)> {
        self.variants.iter().map(|(name, ordinal)| (name.as_ref(), *ordinal))
    }

    /// Find a variant by exact name, falling back to a case-insensitive match
    pub fn by_name(&self, name: &str) -> Option<EnumValue> {
        let lower = name.to_lowercase();
        self.variants
            .iter()
            .find(|(x, _)| x.as_ref() == name)
            .or_else(|| self.variants.iter().find(|(x, _)| x.to_lowercase() == lower))
            .map(|(x, ordinal)| EnumValue::new(self.name.clone(), x.clone(), *ordinal))
    }

    /// Find a variant by its numeric value
    pub fn by_ordinal(&self, ordinal: i64) -> Option<EnumValue> {
        self.variants
            .iter()
            .find(|(_, x)| *x == ordinal)
            .map(|(x, ordinal)| EnumValue::new(self.name.clone(), x.clone(), *ordinal))
    }
}

/// A registered type
#[derive(Debug, Clone)]
pub enum TypeDescriptor {
    Object(Arc<ObjectShape>),
    Enum(Arc<EnumShape>),
}

impl TypeDescriptor {
    pub fn name(&self) -> &TypeName {
        match self {
            TypeDescriptor::Object(x) => x.name(),
            TypeDescriptor::Enum(x) => x.name(),
        }
    }
}

impl From<ObjectShape> for TypeDescriptor {
    fn from(shape: ObjectShape) -> Self {
        TypeDescriptor::Object(Arc::new(shape))
    }
}

impl From<EnumShape> for TypeDescriptor {
    fn from(shape: EnumShape) -> Self {
        TypeDescriptor::Enum(Arc::new(shape))
    }
}
