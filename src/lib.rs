/*!

Materialize JSON token streams into typed object graphs, with support for
shared references (`$id` / `$ref`), polymorphic type names (`$type`),
wrapped collections (`$values`), custom converters, and parameterized
construction.

## Features

- ✔ Lenient: Read JSON with comments, single quotes, unquoted names, and
  `new Date(...)` style constructors
- ✔ Graph aware: Repeated objects are materialized once and shared
- ✔ Polymorphic: Narrow a requested type to the subtype named in the data
- ✔ Ergonomic: Use `#[derive(Graft)]` to describe structs and extract them
- ✔ Extensible: Plug converters in for any type

## Quick Start

```rust
# #[cfg(feature = "derive")] {
use graft::Graft;

#[derive(Graft, PartialEq, Debug)]
#[graft(constructor(name))]
pub struct Model {
    name: String,
    #[graft(rename = "count")]
    total: u16,
    tags: Vec<String>,
    #[graft(default)]
    parent: Option<Box<Model>>,
}

let data = r#"{
    // comments are allowed
    "name": "root",
    "count": 10,
    "tags": ['a', 'b'],
}"#;

let expected = Model {
    name: String::from("root"),
    total: 10,
    tags: vec![String::from("a"), String::from("b")],
    parent: None,
};

let actual: Model = graft::from_str(data).unwrap();
assert_eq!(actual, expected);
# }
```

## Shared References

Without a Rust type to extract into, values can be materialized against
registered shapes and inspected directly. Objects tagged with `$id` are
shared with every `$ref` that points at them.

```rust
use graft::{
    JsonDeserializer, MemberMapping, ObjectShape, TypeCatalog, TypeRef, Value,
};

let catalog = TypeCatalog::new();
catalog.register(
    ObjectShape::builder("Node")
        .default_constructor()
        .member(MemberMapping::new("next", TypeRef::named("Node")))
        .build()?,
);

let deserializer = JsonDeserializer::new().with_catalog(catalog.into());
let json = r#"{"$id": "1", "next": {"$ref": "1"}}"#;
let value = deserializer.value_from_str(json, Some(&TypeRef::named("Node")))?;

let node = value.as_object().unwrap();
let next = node.get("next").unwrap();
assert!(next.same_instance(&value));
# Ok::<(), graft::Error>(())
```

## One Level Lower

The lexer can be used directly, either pulling tokens one at a time with
[`JsonReader`] or lexing a whole document into a [`JsonTape`].

```rust
use graft::{JsonTape, Token};

let tape = JsonTape::from_str("[1, 'a']")?;
assert_eq!(
    tape.tokens(),
    &[
        Token::StartArray,
        Token::Integer(1),
        Token::String(String::from("a")),
        Token::EndArray,
    ]
);
# Ok::<(), graft::Error>(())
```

*/

extern crate self as graft;

mod catalog;
mod de;
mod errors;
mod reference;
pub(crate) mod scalar;
mod settings;
pub(crate) mod stream;
mod text;
mod token;
mod typed;
mod value;

pub use self::catalog::*;
pub use self::de::{Materializer, Nested};
pub use self::errors::*;
pub use self::reference::{ReferenceResolver, ReferenceTable};
pub use self::scalar::{ConversionError, EnumValue, Scalar, ScalarKind};
pub use self::settings::*;
pub use self::stream::{TapeStream, TokenStream};
pub use self::text::*;
pub use self::token::{Token, TokenKind};
#[doc(hidden)]
pub use self::typed::__private;
pub use self::typed::{Describe, FromValue};
pub use self::value::*;

#[cfg(feature = "derive")]
pub use graft_derive::Graft;

/// Deserialize JSON text into a Rust type with default settings
pub fn from_str<T>(json: &str) -> Result<T, Error>
where
    T: Describe + FromValue,
{
    JsonDeserializer::new().from_str(json)
}
