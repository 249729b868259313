use super::Converter;
use crate::{DefaultValueHandling, NullValueHandling, Scalar, TypeRef};
use std::fmt;
use std::sync::Arc;

/// Ties a JSON property name to a member of an object shape
#[derive(Clone)]
pub struct MemberMapping {
    property_name: String,
    member_name: String,
    ty: TypeRef,
    writable: bool,
    required: bool,
    ignored: bool,
    null_value_handling: Option<NullValueHandling>,
    default_value_handling: Option<DefaultValueHandling>,
    default_value: Option<Scalar>,
    converter: Option<Arc<dyn Converter>>,
}

impl MemberMapping {
    /// A writable, optional member whose property name equals its member name
    pub fn new(member_name: &str, ty: TypeRef) -> Self {
        MemberMapping {
            property_name: member_name.to_string(),
            member_name: member_name.to_string(),
            ty,
            writable: true,
            required: false,
            ignored: false,
            null_value_handling: None,
            default_value_handling: None,
            default_value: None,
            converter: None,
        }
    }

    /// Use a different property name in the document
    pub fn rename(mut self, property_name: &str) -> Self {
        self.property_name = property_name.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Never read the property into the member
    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// The member can be populated in place but never assigned
    pub fn readonly(mut self) -> Self {
        self.writable = false;
        self
    }

    pub fn with_null_value_handling(mut self, handling: NullValueHandling) -> Self {
        self.null_value_handling = Some(handling);
        self
    }

    pub fn with_default_value_handling(mut self, handling: DefaultValueHandling) -> Self {
        self.default_value_handling = Some(handling);
        self
    }

    /// The value considered the member's default when default values are
    /// ignored
    pub fn with_default_value(mut self, value: Scalar) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_converter(mut self, converter: Arc<dyn Converter>) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    pub fn member_name(&self) -> &str {
        &self.member_name
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    pub fn null_value_handling(&self) -> Option<NullValueHandling> {
        self.null_value_handling
    }

    pub fn default_value_handling(&self) -> Option<DefaultValueHandling> {
        self.default_value_handling
    }

    pub fn default_value(&self) -> Option<&Scalar> {
        self.default_value.as_ref()
    }

    pub fn converter(&self) -> Option<&Arc<dyn Converter>> {
        self.converter.as_ref()
    }
}

impl fmt::Debug for MemberMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberMapping")
            .field("property_name", &self.property_name)
            .field("member_name", &self.member_name)
            .field("ty", &self.ty)
            .field("writable", &self.writable)
            .field("required", &self.required)
            .field("ignored", &self.ignored)
            .field("converter", &self.converter.as_ref().map(|x| x.name()))
            .finish()
    }
}

/// The members of an object shape, unique by property name and kept in
/// declaration order
#[derive(Debug, Clone, Default)]
pub struct MemberMappingSet {
    members: Vec<MemberMapping>,
}

impl MemberMappingSet {
    /// Add a mapping unless one with the same property name exists
    pub fn insert(&mut self, member: MemberMapping) -> bool {
        if self
            .members
            .iter()
            .any(|x| x.property_name == member.property_name)
        {
            return false;
        }

        self.members.push(member);
        true
    }

    /// Locate the mapping for a property: exact match first, then ignoring
    /// case
    pub fn position(&self, property: &str) -> Option<usize> {
        self.members
            .iter()
            .position(|x| x.property_name == property)
            .or_else(|| {
                self.members
                    .iter()
                    .position(|x| x.property_name.eq_ignore_ascii_case(property))
            })
    }

    pub fn get(&self, property: &str) -> Option<&MemberMapping> {
        self.position(property).map(|idx| &self.members[idx])
    }

    pub fn get_index(&self, idx: usize) -> Option<&MemberMapping> {
        self.members.get(idx)
    }

    /// Find the mapping whose member (not property) has the given name
    pub fn by_member(&self, member: &str) -> Option<&MemberMapping> {
        self.members.iter().find(|x| x.member_name == member)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MemberMapping> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<'a> IntoIterator for &'a MemberMappingSet {
    type Item = &'a MemberMapping;
    type IntoIter = std::slice::Iter<'a, MemberMapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}
