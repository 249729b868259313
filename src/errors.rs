use crate::{ConversionError, TokenKind, TypeName, TypeRef};
use std::fmt;

/// An error that can occur when materializing a token stream
#[derive(Debug)]
pub struct Error(Box<ErrorInner>);

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,

    // innermost segment first, reversed when displayed
    path: Vec<PathSegment>,
}

/// A step on the way from the document root to where an error occurred
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A property of an object or key of a map
    Property(String),

    /// An element of an array
    Index(usize),
}

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Error(Box::new(ErrorInner {
            kind,
            path: Vec::new(),
        }))
    }

    /// Create an error with a free form message. Intended for converters
    /// that need to reject their input.
    pub fn custom<T: fmt::Display>(msg: T) -> Error {
        Error::new(ErrorKind::Custom(msg.to_string()))
    }

    /// Return the specific type of error
    pub fn kind(&self) -> &ErrorKind {
        &self.0.kind
    }

    /// Return the broad family the error belongs to
    pub fn category(&self) -> ErrorCategory {
        self.0.kind.category()
    }

    /// The location in the document where the error occurred, rendered like
    /// `$.orders[2].customer`
    pub fn path(&self) -> String {
        let mut result = String::from("$");
        for segment in self.0.path.iter().rev() {
            match segment {
                PathSegment::Property(name) => {
                    result.push('.');
                    result.push_str(name);
                }
                PathSegment::Index(idx) => {
                    result.push('[');
                    result.push_str(&idx.to_string());
                    result.push(']');
                }
            }
        }
        result
    }

    /// The individual path segments from the document root
    pub fn segments(&self) -> impl Iterator<Item = &PathSegment> {
        self.0.path.iter().rev()
    }

    /// Record that the error occurred underneath the given property
    pub fn at_property(mut self, name: &str) -> Error {
        self.0.path.push(PathSegment::Property(name.to_string()));
        self
    }

    /// Record that the error occurred underneath the given array index
    pub fn at_index(mut self, idx: usize) -> Error {
        self.0.path.push(PathSegment::Index(idx));
        self
    }
}

/// The family of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Unexpected token, premature end of input, or malformed text
    Structural,

    /// Unresolved, duplicated, or unsupported `$id` / `$ref`
    Reference,

    /// A `$type` that is unknown or incompatible with the requested type
    TypeResolution,

    /// A property without a matching member while missing members are errors
    MissingMember,

    /// A required member was absent or null
    MissingRequiredMember,

    /// The target type could not be instantiated
    Construction,

    /// A scalar (or value) could not be converted to the requested type
    Conversion,

    /// The type catalog or a converter was misconfigured
    Configuration,
}

/// Specific type of error
#[derive(Debug)]
pub enum ErrorKind {
    /// A token was encountered where it is not allowed
    UnexpectedToken {
        token: TokenKind,
        context: &'static str,
        depth: usize,
    },

    /// The stream ended before the value was complete
    UnexpectedEnd { context: &'static str },

    /// Nesting exceeded the configured maximum depth
    DepthLimit { limit: usize },

    /// The text could not be split into tokens
    Parse { offset: usize, reason: String },

    /// A `$ref` pointed at an id that was never registered
    UnresolvedReference { id: String },

    /// An `$id` was registered twice
    DuplicateReference { id: String },

    /// An `$id` was attached to a fixed size array or read-only list
    NonReferenceableTarget { ty: TypeRef },

    /// A `$type` could not be bound to a registered type
    TypeResolution { name: String },

    /// A `$type` named a type not assignable to the requested type
    TypeMismatch { specified: TypeName, requested: TypeRef },

    /// A target type name has no registered descriptor
    UnknownType { name: String },

    /// A property has no matching member
    UnknownMember { member: String, ty: TypeName },

    /// A required member was not observed with a non-null value
    MissingRequiredMember { member: String, ty: TypeName },

    /// The target is abstract or an interface
    AbstractType { ty: TypeName },

    /// The target has neither a parameterless nor a parameterized constructor
    NoConstructor { ty: TypeName },

    /// The target has several parameterized constructors and none is preferred
    AmbiguousConstructor { ty: TypeName, candidates: usize },

    /// A member is declared twice on the same shape
    DuplicateMember { member: String, ty: TypeName },

    /// A member converter does not support the member's type
    IncompatibleConverter { member: String, ty: TypeRef },

    /// A value could not be converted to the requested type
    Conversion(ConversionError),

    /// A materialized value did not have the shape a Rust type expected
    Extract {
        expected: &'static str,
        found: &'static str,
    },

    /// Free form error raised by a converter
    Custom(String),
}

impl ErrorKind {
    /// The broad family of this error kind
    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorKind::UnexpectedToken { .. }
            | ErrorKind::UnexpectedEnd { .. }
            | ErrorKind::DepthLimit { .. }
            | ErrorKind::Parse { .. } => ErrorCategory::Structural,
            ErrorKind::UnresolvedReference { .. }
            | ErrorKind::DuplicateReference { .. }
            | ErrorKind::NonReferenceableTarget { .. } => ErrorCategory::Reference,
            ErrorKind::TypeResolution { .. }
            | ErrorKind::TypeMismatch { .. }
            | ErrorKind::UnknownType { .. } => ErrorCategory::TypeResolution,
            ErrorKind::UnknownMember { .. } => ErrorCategory::MissingMember,
            ErrorKind::MissingRequiredMember { .. } => ErrorCategory::MissingRequiredMember,
            ErrorKind::AbstractType { .. }
            | ErrorKind::NoConstructor { .. }
            | ErrorKind::AmbiguousConstructor { .. } => ErrorCategory::Construction,
            ErrorKind::Conversion(_) | ErrorKind::Extract { .. } => ErrorCategory::Conversion,
            ErrorKind::DuplicateMember { .. }
            | ErrorKind::IncompatibleConverter { .. }
            | ErrorKind::Custom(_) => ErrorCategory::Configuration,
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.0.kind {
            ErrorKind::Conversion(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0.kind {
            ErrorKind::UnexpectedToken { token, context, depth } => write!(f,
                "unexpected token {} when {} (depth: {})", token, context, depth
            )?,
            ErrorKind::UnexpectedEnd { context } => write!(f, "unexpected end when {}", context)?,
            ErrorKind::DepthLimit { limit } => write!(f, "maximum nesting depth of {} exceeded", limit)?,
            ErrorKind::Parse { offset, ref reason } => write!(f, "{} (offset: {})", reason, offset)?,
            ErrorKind::UnresolvedReference { ref id } => write!(f, "could not resolve reference '{}'", id)?,
            ErrorKind::DuplicateReference { ref id } => write!(f, "reference '{}' was already registered", id)?,
            ErrorKind::NonReferenceableTarget { ref ty } => write!(f,
                "cannot preserve reference to array or readonly list: {}", ty
            )?,
            ErrorKind::TypeResolution { ref name } => write!(f, "type specified in JSON '{}' was not resolved", name)?,
            ErrorKind::TypeMismatch { ref specified, ref requested } => write!(f,
                "type specified in JSON '{}' is not compatible with '{}'", specified, requested
            )?,
            ErrorKind::UnknownType { ref name } => write!(f, "no descriptor registered for type '{}'", name)?,
            ErrorKind::UnknownMember { ref member, ref ty } => write!(f,
                "could not find member '{}' on object of type '{}'", member, ty
            )?,
            ErrorKind::MissingRequiredMember { ref member, ref ty } => write!(f,
                "required property '{}' of '{}' not found in JSON", member, ty
            )?,
            ErrorKind::AbstractType { ref ty } => write!(f,
                "could not create an instance of type {}: type is an interface or abstract", ty
            )?,
            ErrorKind::NoConstructor { ref ty } => write!(f, "could not find a constructor for type {}", ty)?,
            ErrorKind::AmbiguousConstructor { ref ty, candidates } => write!(f,
                "type {} has {} candidate constructors and none is preferred", ty, candidates
            )?,
            ErrorKind::DuplicateMember { ref member, ref ty } => write!(f,
                "member '{}' declared more than once on '{}'", member, ty
            )?,
            ErrorKind::IncompatibleConverter { ref member, ref ty } => write!(f,
                "converter on '{}' is not compatible with member type {}", member, ty
            )?,
            ErrorKind::Conversion(ref err) => write!(f, "conversion error: {}", err)?,
            ErrorKind::Extract { expected, found } => write!(f, "expected {}, found {}", expected, found)?,
            ErrorKind::Custom(ref msg) => write!(f, "{}", msg)?,
        }

        if !self.0.path.is_empty() {
            write!(f, " (path: {})", self.path())?;
        }

        Ok(())
    }
}

impl From<ConversionError> for Error {
    fn from(error: ConversionError) -> Self {
        Error::new(ErrorKind::Conversion(error))
    }
}
