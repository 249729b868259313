//! Static type descriptors that drive materialization
//!
//! A [`TypeCatalog`] is the registry the materializer consults for the shape
//! of a named type, the converter responsible for a type, and the binder
//! that resolves `$type` names. It is shared between threads and filled
//! lazily as typed values are requested.

mod binder;
mod converter;
mod mapping;
mod shape;

pub use self::binder::{CatalogBinder, TypeBinder};
pub use self::converter::Converter;
pub use self::mapping::{MemberMapping, MemberMappingSet};
pub use self::shape::{
    Constructor, EnumShape, MapKind, ObjectShape, ObjectShapeBuilder, Parameter, SequenceKind,
    TypeDescriptor, TypeName, TypeRef,
};

use crate::{Describe, Error, ErrorKind};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Registry of type descriptors and converters
///
/// ```
/// use graft::{EnumShape, TypeCatalog, TypeRef};
///
/// let catalog = TypeCatalog::new();
/// catalog.register(EnumShape::new("Color", [("Red", 0), ("Blue", 1)]));
/// assert!(catalog.enum_shape("Color").is_ok());
/// assert!(catalog.object_shape("Color").is_err());
/// ```
pub struct TypeCatalog {
    types: RwLock<HashMap<TypeName, TypeDescriptor>>,
    converters: RwLock<Vec<Arc<dyn Converter>>>,
    converter_cache: RwLock<HashMap<TypeRef, Option<Arc<dyn Converter>>>>,
    binder: Arc<dyn TypeBinder>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        TypeCatalog {
            types: RwLock::new(HashMap::new()),
            converters: RwLock::new(Vec::new()),
            converter_cache: RwLock::new(HashMap::new()),
            binder: Arc::new(CatalogBinder),
        }
    }

    /// Replace the binder used to resolve `$type` names
    pub fn with_binder(mut self, binder: Arc<dyn TypeBinder>) -> Self {
        self.binder = binder;
        self
    }

    /// Add a converter consulted for every value
    pub fn with_converter(self, converter: Arc<dyn Converter>) -> Self {
        self.add_converter(converter);
        self
    }

    /// Register a descriptor, replacing any previous one of the same name
    pub fn register<T: Into<TypeDescriptor>>(&self, descriptor: T) {
        let descriptor = descriptor.into();
        log::debug!("registering type {}", descriptor.name());
        self.types
            .write()
            .insert(descriptor.name().clone(), descriptor);
    }

    /// Register the descriptor built by `f` unless the name is already
    /// registered. Returns whether this call published the descriptor.
    ///
    /// The descriptor is built outside the lock, so concurrent callers may
    /// build it more than once but only the first publishes it.
    pub fn get_or_register<F, T>(&self, name: &str, f: F) -> Result<bool, Error>
    where
        F: FnOnce() -> Result<T, Error>,
        T: Into<TypeDescriptor>,
    {
        if self.types.read().contains_key(name) {
            return Ok(false);
        }

        let descriptor = f()?.into();
        let mut types = self.types.write();
        if types.contains_key(name) {
            return Ok(false);
        }

        log::debug!("registering type {}", name);
        types.insert(TypeName::from(name), descriptor);
        Ok(true)
    }

    /// Register the descriptor of a Rust type and everything it references
    pub fn register_type<T: Describe>(&self) -> Result<(), Error> {
        T::register(self)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.read().contains_key(name)
    }

    pub fn descriptor(&self, name: &str) -> Result<TypeDescriptor, Error> {
        self.types
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::new(ErrorKind::UnknownType { name: name.to_string() }))
    }

    pub fn object_shape(&self, name: &str) -> Result<Arc<ObjectShape>, Error> {
        match self.descriptor(name)? {
            TypeDescriptor::Object(shape) => Ok(shape),
            TypeDescriptor::Enum(_) => Err(Error::new(ErrorKind::UnknownType {
                name: name.to_string(),
            })),
        }
    }

    pub fn enum_shape(&self, name: &str) -> Result<Arc<EnumShape>, Error> {
        match self.descriptor(name)? {
            TypeDescriptor::Enum(shape) => Ok(shape),
            TypeDescriptor::Object(_) => Err(Error::new(ErrorKind::UnknownType {
                name: name.to_string(),
            })),
        }
    }

    pub fn add_converter(&self, converter: Arc<dyn Converter>) {
        self.converters.write().push(converter);
        self.converter_cache.write().clear();
    }

    /// The first registered converter that accepts the type. Lookups are
    /// cached per type.
    pub fn matching_converter(&self, ty: &TypeRef) -> Option<Arc<dyn Converter>> {
        if let Some(cached) = self.converter_cache.read().get(ty) {
            return cached.clone();
        }

        let found = self
            .converters
            .read()
            .iter()
            .find(|x| x.can_convert(ty))
            .cloned();

        let mut cache = self.converter_cache.write();
        let entry = cache.entry(ty.clone()).or_insert_with(|| {
            if let Some(converter) = &found {
                log::trace!("converter {} selected for {}", converter.name(), ty);
            }
            found
        });
        entry.clone()
    }

    pub fn binder(&self) -> &Arc<dyn TypeBinder> {
        &self.binder
    }

    /// Resolve a `$type` value of the form `Type[, Assembly]`
    pub fn bind(&self, qualified: &str) -> Result<TypeName, Error> {
        let (name, assembly) = binder::split_qualified_name(qualified);
        self.binder
            .bind_to_type(self, assembly, name)
            .ok_or_else(|| Error::new(ErrorKind::TypeResolution { name: qualified.to_string() }))
    }

    /// Whether a value of the candidate type can stand in for the requested
    /// type: it is the same type, or the requested type appears among the
    /// candidate's bases or implemented interfaces.
    pub fn is_assignable(&self, requested: &TypeRef, candidate: &TypeName) -> bool {
        match requested {
            TypeRef::Any => true,
            TypeRef::Named(name) => self.derives_from(candidate, name),
            _ => false,
        }
    }

    fn derives_from(&self, candidate: &TypeName, target: &TypeName) -> bool {
        let mut pending = vec![candidate.clone()];
        let mut visited: Vec<TypeName> = Vec::new();
        while let Some(current) = pending.pop() {
            if current == *target {
                return true;
            }

            if visited.contains(&current) {
                continue;
            }

            if let Ok(shape) = self.object_shape(&current) {
                pending.extend(shape.base().cloned());
                pending.extend(shape.interfaces().iter().cloned());
            }
            visited.push(current);
        }

        false
    }
}

impl Default for TypeCatalog {
    fn default() -> Self {
        TypeCatalog::new()
    }
}

impl fmt::Debug for TypeCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<TypeName> = self.types.read().keys().cloned().collect();
        names.sort();
        f.debug_struct("TypeCatalog")
            .field("types", &names)
            .field("converters", &self.converters.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::de::Nested;
    use crate::{ScalarKind, TokenStream, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn animals() -> TypeCatalog {
        let catalog = TypeCatalog::new();
        catalog.register(ObjectShape::builder("Animal").abstract_type().build().unwrap());
        catalog.register(
            ObjectShape::builder("Dog")
                .assembly("Zoo")
                .base("Animal")
                .implements("Pet")
                .default_constructor()
                .build()
                .unwrap(),
        );
        catalog.register(
            ObjectShape::builder("Puppy")
                .base("Dog")
                .default_constructor()
                .build()
                .unwrap(),
        );
        catalog.register(ObjectShape::builder("Rock").default_constructor().build().unwrap());
        catalog
    }

    #[test]
    fn assignability_walks_bases_and_interfaces() {
        let catalog = animals();
        let puppy = TypeName::from("Puppy");
        assert!(catalog.is_assignable(&TypeRef::named("Animal"), &puppy));
        assert!(catalog.is_assignable(&TypeRef::named("Pet"), &puppy));
        assert!(catalog.is_assignable(&TypeRef::named("Puppy"), &puppy));
        assert!(catalog.is_assignable(&TypeRef::Any, &puppy));
        assert!(!catalog.is_assignable(&TypeRef::named("Rock"), &puppy));
        assert!(!catalog.is_assignable(&TypeRef::list(TypeRef::Any), &puppy));
    }

    #[test]
    fn binds_qualified_names() {
        let catalog = animals();
        assert_eq!(catalog.bind("Dog, Zoo").unwrap().as_ref(), "Dog");
        assert_eq!(catalog.bind("Dog").unwrap().as_ref(), "Dog");
        assert_eq!(catalog.bind("Puppy, Anything").unwrap().as_ref(), "Puppy");

        let err = catalog.bind("Dog, Farm").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::TypeResolution { name } if name == "Dog, Farm"));
        assert!(catalog.bind("Cat").is_err());
    }

    #[test]
    fn get_or_register_publishes_once() {
        let catalog = TypeCatalog::new();
        let first = catalog
            .get_or_register("Thing", || ObjectShape::builder("Thing").build())
            .unwrap();
        let second = catalog
            .get_or_register("Thing", || -> Result<ObjectShape, Error> {
                panic!("descriptor built twice")
            })
            .unwrap();
        assert!(first);
        assert!(!second);
    }

    struct CountingConverter(AtomicUsize);

    impl Converter for CountingConverter {
        fn can_convert(&self, ty: &TypeRef) -> bool {
            self.0.fetch_add(1, Ordering::SeqCst);
            *ty == TypeRef::Scalar(ScalarKind::Date)
        }

        fn read_json(
            &self,
            _stream: &mut dyn TokenStream,
            _ty: &TypeRef,
            _nested: &mut Nested<'_, '_>,
        ) -> Result<Value, Error> {
            Ok(Value::Null)
        }
    }

    #[test]
    fn converter_lookup_is_cached() {
        let converter = Arc::new(CountingConverter(AtomicUsize::new(0)));
        let catalog = TypeCatalog::new().with_converter(converter.clone());
        let date = TypeRef::Scalar(ScalarKind::Date);
        assert!(catalog.matching_converter(&date).is_some());
        assert!(catalog.matching_converter(&date).is_some());
        assert!(catalog.matching_converter(&TypeRef::Raw).is_none());
        assert!(catalog.matching_converter(&TypeRef::Raw).is_none());
        assert_eq!(converter.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn catalog_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TypeCatalog>();
    }
}
