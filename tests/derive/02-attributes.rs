#![allow(dead_code)]

use graft::Graft;

#[derive(Graft)]
#[graft(name = "Ledger.Entry")]
pub struct Entry {
    #[graft(rename = "entry_id", required)]
    id: String,
    #[graft(default)]
    tags: Vec<String>,
    #[graft(readonly, default)]
    history: Vec<u32>,
    #[graft(ignore)]
    scratch: std::cell::Cell<u8>,
}

fn main() {
    let catalog = graft::TypeCatalog::new();
    catalog.register_type::<Entry>().unwrap();
    let shape = catalog.object_shape("Ledger.Entry").unwrap();
    assert!(shape.members().get("entry_id").unwrap().is_required());
    assert!(!shape.members().get("history").unwrap().is_writable());
    assert!(shape.members().get("scratch").unwrap().is_ignored());
}
