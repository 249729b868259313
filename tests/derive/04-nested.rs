#![allow(dead_code)]

use graft::{Graft, ObjectRef, RawJson};
use std::collections::{BTreeMap, HashMap};

#[derive(Graft)]
#[graft(base = "Shape")]
pub struct Group {
    children: Vec<Box<Group>>,
    parent: Option<ObjectRef>,
    index: HashMap<String, Vec<Option<u8>>>,
    sorted: BTreeMap<i32, String>,
    extra: serde_json::Value,
    raw: Option<RawJson>,
    created: Option<chrono::DateTime<chrono::Utc>>,
}

fn main() {
    let catalog = graft::TypeCatalog::new();
    catalog.register_type::<Group>().unwrap();
    assert_eq!(
        catalog.object_shape("Group").unwrap().base().map(|x| x.as_ref()),
        Some("Shape")
    );
}
