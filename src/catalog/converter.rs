use crate::de::Nested;
use crate::{Error, TokenStream, TypeRef, Value};

/// Custom materialization logic for a set of target types.
///
/// Once a converter is selected for a value it owns the whole subtree: it
/// starts on the value's first token and must leave the stream on the
/// value's last token. Nested values can be handed back to the materializer
/// through the given [`Nested`] handle.
///
/// ```
/// use graft::{Converter, Error, Nested, Scalar, ScalarKind, Token, TokenStream, TypeRef, Value};
///
/// /// Reads `"x,y"` strings into a two element list
/// struct PairConverter;
///
/// impl Converter for PairConverter {
///     fn can_convert(&self, ty: &TypeRef) -> bool {
///         *ty == TypeRef::named("Pair")
///     }
///
///     fn read_json(
///         &self,
///         stream: &mut dyn TokenStream,
///         _ty: &TypeRef,
///         _nested: &mut Nested<'_, '_>,
///     ) -> Result<Value, Error> {
///         match stream.token() {
///             Token::String(s) => {
///                 let parts: Vec<Value> = s.split(',').map(|x| Value::from(x.trim())).collect();
///                 Ok(Value::list(TypeRef::Scalar(ScalarKind::String), parts))
///             }
///             _ => Err(Error::custom("expected a pair string")),
///         }
///     }
/// }
/// ```
pub trait Converter: Send + Sync {
    /// Whether this converter handles values of the given type
    fn can_convert(&self, ty: &TypeRef) -> bool;

    /// Materialize the value beginning at the stream's current token
    fn read_json(
        &self,
        stream: &mut dyn TokenStream,
        ty: &TypeRef,
        nested: &mut Nested<'_, '_>,
    ) -> Result<Value, Error>;

    /// Name used in diagnostics
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
