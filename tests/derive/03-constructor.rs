#![allow(dead_code)]

use graft::Graft;

#[derive(Graft)]
#[graft(constructor(x, y))]
pub struct Point {
    #[graft(rename = "X")]
    x: i64,
    y: i64,
    label: Option<String>,
}

fn main() {
    let catalog = graft::TypeCatalog::new();
    catalog.register_type::<Point>().unwrap();
    let shape = catalog.object_shape("Point").unwrap();
    assert!(shape.default_constructor().is_none());
    let ctor = shape.parameterized_constructors().next().unwrap();
    assert_eq!(ctor.params()[0].name(), "X");
    assert_eq!(ctor.params()[0].member(), "x");
}
