use super::{TypeCatalog, TypeDescriptor, TypeName};

/// Maps the name carried by a `$type` property onto a registered type.
///
/// Only types a binder returns can be instantiated from a document, so a
/// binder is the place to restrict which types untrusted input may name.
pub trait TypeBinder: Send + Sync {
    /// Resolve an (optionally assembly qualified) type name
    fn bind_to_type(
        &self,
        catalog: &TypeCatalog,
        assembly: Option<&str>,
        name: &str,
    ) -> Option<TypeName>;
}

/// Resolves names against the catalog's registered descriptors. When an
/// assembly is given, an object shape must carry the same assembly label.
#[derive(Debug, Default, Clone, Copy)]
pub struct CatalogBinder;

impl TypeBinder for CatalogBinder {
    fn bind_to_type(
        &self,
        catalog: &TypeCatalog,
        assembly: Option<&str>,
        name: &str,
    ) -> Option<TypeName> {
        let descriptor = catalog.descriptor(name).ok()?;
        match (&descriptor, assembly) {
            (TypeDescriptor::Object(shape), Some(assembly)) => match shape.assembly() {
                Some(label) if label.as_ref() != assembly => None,
                _ => Some(shape.name().clone()),
            },
            (x, _) => Some(x.name().clone()),
        }
    }
}

/// Split `"Type, Assembly"` into its type and assembly halves. Generic
/// argument lists in brackets may contain commas and are kept intact.
pub(crate) fn split_qualified_name(qualified: &str) -> (&str, Option<&str>) {
    let mut depth = 0usize;
    for (idx, c) in qualified.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                let name = qualified[..idx].trim();
                let assembly = qualified[idx + 1..].trim();
                return (name, Some(assembly).filter(|x| !x.is_empty()));
            }
            _ => {}
        }
    }

    (qualified.trim(), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Shop.Order", "Shop.Order", None)]
    #[case("Shop.Order, Shop", "Shop.Order", Some("Shop"))]
    #[case(" Shop.Order ,  Shop ", "Shop.Order", Some("Shop"))]
    #[case("List[[Shop.Order, Shop]], Core", "List[[Shop.Order, Shop]]", Some("Core"))]
    #[case("Shop.Order,", "Shop.Order", None)]
    fn qualified_names(#[case] input: &str, #[case] name: &str, #[case] assembly: Option<&str>) {
        assert_eq!(split_qualified_name(input), (name, assembly));
    }
}
