use crate::{Scalar, SequenceKind, TypeName, TypeRef};
use indexmap::IndexMap;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

/// A materialized value.
///
/// Objects, lists, and maps are shared handles so that a document can refer
/// to the same instance from several places (`$id` / `$ref`). Two composite
/// values are equal only when they are the same instance.
///
/// A document that references an ancestor creates a reference cycle, which
/// keeps the instances alive until the cycle is broken by removing one of
/// the members.
#[derive(Clone)]
pub enum Value {
    Null,

    /// The database null sentinel, produced for `null` when the target
    /// type asks for it
    DbNull,

    Scalar(Scalar),

    Object(ObjectRef),

    List(ListRef),

    Map(MapRef),

    /// A loosely typed tree for untyped or explicitly tree typed targets
    Tree(serde_json::Value),

    /// A subtree captured verbatim as JSON text
    Raw(RawJson),
}

impl Value {
    /// A new growable list
    pub fn list(item: TypeRef, items: Vec<Value>) -> Value {
        Value::List(ListRef::new(SequenceKind::List, item, items))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(Scalar::String(x)) => Some(x),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListRef> {
        match self {
            Value::List(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapRef> {
        match self {
            Value::Map(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_tree(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Tree(x) => Some(x),
            _ => None,
        }
    }

    /// A short description of the variant for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::DbNull => "dbnull",
            Value::Scalar(_) => "scalar",
            Value::Object(_) => "object",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Tree(_) => "tree",
            Value::Raw(_) => "raw json",
        }
    }

    /// Whether nested data can be read into this value in place. Fixed
    /// arrays and read-only lists can't be.
    pub fn is_reusable(&self) -> bool {
        match self {
            Value::Object(_) | Value::Map(_) => true,
            Value::List(x) => x.kind().is_growable(),
            _ => false,
        }
    }

    /// Whether both values are the same shared instance
    pub fn same_instance(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => a.same_instance(b),
            (Value::List(a), Value::List(b)) => a.same_instance(b),
            (Value::Map(a), Value::Map(b)) => a.same_instance(b),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) | (Value::DbNull, Value::DbNull) => true,
            (Value::Scalar(a), Value::Scalar(b)) => a == b,
            (Value::Tree(a), Value::Tree(b)) => a == b,
            (Value::Raw(a), Value::Raw(b)) => a == b,
            _ => self.same_instance(other),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::DbNull => f.write_str("DbNull"),
            Value::Scalar(x) => f.debug_tuple("Scalar").field(x).finish(),
            Value::Object(x) => x.fmt(f),
            Value::List(x) => x.fmt(f),
            Value::Map(x) => x.fmt(f),
            Value::Tree(x) => f.debug_tuple("Tree").field(x).finish(),
            Value::Raw(x) => f.debug_tuple("Raw").field(&x.as_str()).finish(),
        }
    }
}

impl From<Scalar> for Value {
    fn from(x: Scalar) -> Self {
        Value::Scalar(x)
    }
}

impl From<&str> for Value {
    fn from(x: &str) -> Self {
        Value::Scalar(Scalar::String(x.to_string()))
    }
}

impl From<String> for Value {
    fn from(x: String) -> Self {
        Value::Scalar(Scalar::String(x))
    }
}

macro_rules! scalar_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(x: $ty) -> Self {
                    Value::Scalar(Scalar::$variant(x))
                }
            }
        )*
    };
}

scalar_from!(
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    char => Char,
);

impl From<ObjectRef> for Value {
    fn from(x: ObjectRef) -> Self {
        Value::Object(x)
    }
}

impl From<ListRef> for Value {
    fn from(x: ListRef) -> Self {
        Value::List(x)
    }
}

impl From<MapRef> for Value {
    fn from(x: MapRef) -> Self {
        Value::Map(x)
    }
}

/// JSON text of a captured subtree
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RawJson(String);

impl RawJson {
    pub fn new(json: String) -> Self {
        RawJson(json)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RawJson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The members of an object, in the order they were set
#[derive(Clone)]
pub struct Instance {
    ty: TypeName,
    fields: IndexMap<String, Value>,
}

impl Instance {
    pub fn new(ty: TypeName) -> Self {
        Instance {
            ty,
            fields: IndexMap::new(),
        }
    }

    pub fn type_name(&self) -> &TypeName {
        &self.ty
    }

    pub fn get(&self, member: &str) -> Option<&Value> {
        self.fields.get(member)
    }

    pub fn set(&mut self, member: &str, value: Value) {
        self.fields.insert(member.to_string(), value);
    }

    pub fn remove(&mut self, member: &str) -> Option<Value> {
        self.fields.shift_remove(member)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct(&self.ty);
        for (name, value) in &self.fields {
            out.field(name, value);
        }
        out.finish()
    }
}

/// A shared handle to an object instance
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Instance>>);

impl ObjectRef {
    pub fn new(instance: Instance) -> Self {
        ObjectRef(Rc::new(RefCell::new(instance)))
    }

    pub fn type_name(&self) -> TypeName {
        self.0.borrow().ty.clone()
    }

    /// A clone of the member's current value
    pub fn get(&self, member: &str) -> Option<Value> {
        self.0.borrow().get(member).cloned()
    }

    pub fn set(&self, member: &str, value: Value) {
        self.0.borrow_mut().set(member, value);
    }

    pub fn borrow(&self) -> Ref<'_, Instance> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Instance> {
        self.0.borrow_mut()
    }

    pub fn same_instance(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // members are not followed as the graph may be cyclic
        match self.0.try_borrow() {
            Ok(instance) => write!(f, "Object({} @ {:p})", instance.ty, Rc::as_ptr(&self.0)),
            Err(_) => write!(f, "Object(@ {:p})", Rc::as_ptr(&self.0)),
        }
    }
}

/// Items of a sequence together with its declared kind and item type
#[derive(Debug, Clone)]
pub struct ListInstance {
    kind: SequenceKind,
    item: TypeRef,
    items: Vec<Value>,
}

impl ListInstance {
    pub fn kind(&self) -> SequenceKind {
        self.kind
    }

    pub fn item_type(&self) -> &TypeRef {
        &self.item
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    /// Append an item. Fixed arrays and read-only lists reject new items.
    pub fn push(&mut self, value: Value) -> bool {
        if !self.kind.is_growable() {
            return false;
        }

        self.items.push(value);
        true
    }
}

/// A shared handle to a list
#[derive(Clone)]
pub struct ListRef(Rc<RefCell<ListInstance>>);

impl ListRef {
    pub fn new(kind: SequenceKind, item: TypeRef, items: Vec<Value>) -> Self {
        ListRef(Rc::new(RefCell::new(ListInstance { kind, item, items })))
    }

    pub fn kind(&self) -> SequenceKind {
        self.0.borrow().kind
    }

    pub fn len(&self) -> usize {
        self.0.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, idx: usize) -> Option<Value> {
        self.0.borrow().items.get(idx).cloned()
    }

    /// A snapshot of the items
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().items.clone()
    }

    pub fn borrow(&self) -> Ref<'_, ListInstance> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, ListInstance> {
        self.0.borrow_mut()
    }

    pub fn same_instance(&self, other: &ListRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ListRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(list) => write!(
                f,
                "List({:?}<{}> len {} @ {:p})",
                list.kind,
                list.item,
                list.items.len(),
                Rc::as_ptr(&self.0)
            ),
            Err(_) => write!(f, "List(@ {:p})", Rc::as_ptr(&self.0)),
        }
    }
}

/// Entries of a map in insertion order
#[derive(Debug, Clone)]
pub struct MapInstance {
    key: TypeRef,
    value: TypeRef,
    entries: IndexMap<Scalar, Value>,
}

impl MapInstance {
    pub fn key_type(&self) -> &TypeRef {
        &self.key
    }

    pub fn value_type(&self) -> &TypeRef {
        &self.value
    }

    pub fn get(&self, key: &Scalar) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Insert an entry, replacing the value of an existing key
    pub fn insert(&mut self, key: Scalar, value: Value) -> Option<Value> {
        self.entries.insert(key, value)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Scalar, &Value)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A shared handle to a map
#[derive(Clone)]
pub struct MapRef(Rc<RefCell<MapInstance>>);

impl MapRef {
    pub fn new(key: TypeRef, value: TypeRef) -> Self {
        MapRef(Rc::new(RefCell::new(MapInstance {
            key,
            value,
            entries: IndexMap::new(),
        })))
    }

    pub fn len(&self) -> usize {
        self.0.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &Scalar) -> Option<Value> {
        self.0.borrow().entries.get(key).cloned()
    }

    pub fn insert(&self, key: Scalar, value: Value) -> Option<Value> {
        self.0.borrow_mut().insert(key, value)
    }

    /// A snapshot of the entries
    pub fn to_vec(&self) -> Vec<(Scalar, Value)> {
        self.0
            .borrow()
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn borrow(&self) -> Ref<'_, MapInstance> {
        self.0.borrow()
    }

    pub fn same_instance(&self, other: &MapRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for MapRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(map) => write!(
                f,
                "Map<{}, {}>(len {} @ {:p})",
                map.key,
                map.value,
                map.entries.len(),
                Rc::as_ptr(&self.0)
            ),
            Err(_) => write!(f, "Map(@ {:p})", Rc::as_ptr(&self.0)),
        }
    }
}
