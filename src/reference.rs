use crate::{Error, ErrorKind, Value};
use std::collections::HashMap;

/// Records instances by `$id` so later `$ref` properties can share them
pub trait ReferenceResolver {
    /// Register an instance under an id
    fn add_reference(&mut self, id: &str, value: Value) -> Result<(), Error>;

    /// Look up a previously registered instance
    fn resolve_reference(&self, id: &str) -> Result<Value, Error>;
}

/// The default resolver: a write-once table scoped to a single document
#[derive(Debug, Default, Clone)]
pub struct ReferenceTable {
    values: HashMap<String, Value>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        ReferenceTable::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl ReferenceResolver for ReferenceTable {
    fn add_reference(&mut self, id: &str, value: Value) -> Result<(), Error> {
        if self.values.contains_key(id) {
            return Err(Error::new(ErrorKind::DuplicateReference { id: id.to_string() }));
        }

        log::debug!("registered reference {} as {}", id, value.kind_name());
        self.values.insert(id.to_string(), value);
        Ok(())
    }

    fn resolve_reference(&self, id: &str) -> Result<Value, Error> {
        self.values
            .get(id)
            .cloned()
            .ok_or_else(|| Error::new(ErrorKind::UnresolvedReference { id: id.to_string() }))
    }
}
