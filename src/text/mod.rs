//! Types for reading JSON text
//!
//! [`JsonReader`] pulls tokens from text one at a time, while
//! [`JsonTape`] lexes a whole document up front so it can be materialized
//! repeatedly. [`JsonDeserializer`] ties either one to a catalog and
//! settings.
mod de;
mod lexer;
mod tape;
mod writer;

pub use self::de::JsonDeserializer;
pub use self::lexer::JsonReader;
pub use self::tape::{JsonTape, JsonTapeParser};
pub use self::writer::*;
