use serde::Deserialize;

/// What to do with a property that has no matching member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingMemberHandling {
    /// Skip the property's value
    #[default]
    Ignore,

    /// Fail with an unknown member error
    Error,
}

/// Whether a null value is written to a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullValueHandling {
    #[default]
    Include,

    /// Leave the member's current value untouched
    Ignore,
}

/// Whether a value equal to the member's declared default is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultValueHandling {
    #[default]
    Include,

    /// Leave the member's current value untouched
    Ignore,
}

/// Whether nested objects and lists are read into a member's existing
/// instance or replace it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectCreationHandling {
    /// Reuse existing instances
    #[default]
    Auto,

    /// Reuse existing instances
    Reuse,

    /// Always create new instances
    Replace,
}

/// Whether `$type` properties are honored. When reading, every mode other
/// than [`TypeNameHandling::None`] honors them; the distinction between the
/// remaining modes only matters to writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeNameHandling {
    /// Read and discard `$type`
    None,
    Objects,
    Arrays,
    All,
    #[default]
    Auto,
}

/// Global policies for materialization.
///
/// Settings are immutable once handed to a materializer. They can be built
/// in code or loaded from a configuration file.
///
/// ```
/// use graft::{MissingMemberHandling, Settings};
///
/// let settings = Settings::new()
///     .with_missing_member_handling(MissingMemberHandling::Error)
///     .with_max_depth(32);
///
/// let from_config: Settings = serde_json::from_str(r#"{
///     "missing_member_handling": "error",
///     "max_depth": 32
/// }"#)?;
/// assert_eq!(settings, from_config);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    missing_member_handling: MissingMemberHandling,
    null_value_handling: NullValueHandling,
    default_value_handling: DefaultValueHandling,
    object_creation_handling: ObjectCreationHandling,
    type_name_handling: TypeNameHandling,
    max_depth: usize,
}

impl Settings {
    /// Creates the structure with default policies
    pub fn new() -> Self {
        Settings::default()
    }

    pub fn with_missing_member_handling(mut self, handling: MissingMemberHandling) -> Settings {
        self.missing_member_handling = handling;
        self
    }

    pub fn with_null_value_handling(mut self, handling: NullValueHandling) -> Settings {
        self.null_value_handling = handling;
        self
    }

    pub fn with_default_value_handling(mut self, handling: DefaultValueHandling) -> Settings {
        self.default_value_handling = handling;
        self
    }

    pub fn with_object_creation_handling(mut self, handling: ObjectCreationHandling) -> Settings {
        self.object_creation_handling = handling;
        self
    }

    pub fn with_type_name_handling(mut self, handling: TypeNameHandling) -> Settings {
        self.type_name_handling = handling;
        self
    }

    /// Sets how deeply values may nest before materialization fails
    pub fn with_max_depth(mut self, max_depth: usize) -> Settings {
        self.max_depth = max_depth;
        self
    }

    pub fn missing_member_handling(&self) -> MissingMemberHandling {
        self.missing_member_handling
    }

    pub fn null_value_handling(&self) -> NullValueHandling {
        self.null_value_handling
    }

    pub fn default_value_handling(&self) -> DefaultValueHandling {
        self.default_value_handling
    }

    pub fn object_creation_handling(&self) -> ObjectCreationHandling {
        self.object_creation_handling
    }

    pub fn type_name_handling(&self) -> TypeNameHandling {
        self.type_name_handling
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Whether nested data should be read into a member's current instance
    pub(crate) fn reuses_existing(&self) -> bool {
        matches!(
            self.object_creation_handling,
            ObjectCreationHandling::Auto | ObjectCreationHandling::Reuse
        )
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            missing_member_handling: MissingMemberHandling::Ignore,
            null_value_handling: NullValueHandling::Include,
            default_value_handling: DefaultValueHandling::Include,
            object_creation_handling: ObjectCreationHandling::Auto,
            type_name_handling: TypeNameHandling::Auto,
            max_depth: 128,
        }
    }
}
