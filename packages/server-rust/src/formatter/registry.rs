use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use super::{Formatter, Logstash, Plain};

/// Type-erased object offered to the registry as a formatter candidate.
pub type ErasedObject = Arc<dyn Any + Send + Sync>;

/// Converts an erased object back into a formatter handle if its type matches.
type Caster = fn(ErasedObject) -> Option<Arc<dyn Formatter>>;

// ---------------------------------------------------------------------------
// FormatterError
// ---------------------------------------------------------------------------

/// Errors from resolving a [`FormatterRef`].
///
/// `Clone` so a resolver can cache a failed resolution and return it again.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatterError {
    #[error("formatter not found: {name}")]
    NotFound { name: String },
    #[error("invalid formatter: {type_name} is not a registered formatter type")]
    Invalid { type_name: String },
}

// ---------------------------------------------------------------------------
// TypeRef
// ---------------------------------------------------------------------------

/// Reference to a constructible type, instantiated with `Default`.
#[derive(Clone, Copy)]
pub struct TypeRef {
    type_name: &'static str,
    construct: fn() -> ErasedObject,
    cast: Option<Caster>,
}

impl TypeRef {
    /// Reference to any default-constructible type. Whether it is a usable
    /// formatter is decided by the registry at resolution time, so a
    /// [`Formatter`] referenced this way must be `register`ed or `allow`ed.
    /// Use [`TypeRef::formatter`] for types known to implement it.
    #[must_use]
    pub fn of<T: Any + Default + Send + Sync>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            construct: construct_default::<T>,
            cast: None,
        }
    }

    /// Reference to a type statically known to implement [`Formatter`].
    #[must_use]
    pub fn formatter<T: Formatter + Default + 'static>() -> Self {
        Self {
            cast: Some(cast_to::<T>),
            ..Self::of::<T>()
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn instantiate(&self) -> ErasedObject {
        (self.construct)()
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRef")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

fn construct_default<T: Any + Default + Send + Sync>() -> ErasedObject {
    Arc::new(T::default())
}

fn cast_to<T: Formatter + 'static>(object: ErasedObject) -> Option<Arc<dyn Formatter>> {
    object
        .downcast::<T>()
        .ok()
        .map(|formatter| formatter as Arc<dyn Formatter>)
}

fn cast_shared(object: ErasedObject) -> Option<Arc<dyn Formatter>> {
    object
        .downcast::<Arc<dyn Formatter>>()
        .ok()
        .map(|shared| Arc::clone(&*shared))
}

// ---------------------------------------------------------------------------
// FormatterRef
// ---------------------------------------------------------------------------

/// The three configuration shapes a formatter may be given in.
#[derive(Clone)]
pub enum FormatterRef {
    /// Symbolic name of a registered formatter, e.g. `"logstash"`.
    Named(String),
    /// Type to instantiate with `Default`.
    Type(TypeRef),
    /// Ready object, used as-is once validated.
    Instance {
        object: ErasedObject,
        type_name: &'static str,
    },
}

impl FormatterRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Wraps an arbitrary object. Resolution fails unless its type is
    /// registered or allowed; use [`FormatterRef::from_formatter`] for an
    /// object already typed as a formatter.
    pub fn instance<T: Any + Send + Sync>(object: T) -> Self {
        Self::Instance {
            object: Arc::new(object),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Wraps an already-typed formatter.
    #[must_use]
    pub fn from_formatter(formatter: Arc<dyn Formatter>) -> Self {
        Self::Instance {
            object: Arc::new(formatter),
            type_name: std::any::type_name::<Arc<dyn Formatter>>(),
        }
    }
}

impl Default for FormatterRef {
    fn default() -> Self {
        Self::named("plain")
    }
}

impl fmt::Debug for FormatterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Type(type_ref) => f.debug_tuple("Type").field(type_ref).finish(),
            Self::Instance { type_name, .. } => {
                f.debug_struct("Instance").field("type_name", type_name).finish()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// FormatterRegistry
// ---------------------------------------------------------------------------

/// Registry of known formatter types.
///
/// Provides two lookups:
/// - **By name**: capitalized symbolic name (`"logstash"` -> `"Logstash"`) to a [`TypeRef`]
/// - **By type**: `TypeId` to the caster that proves the type implements [`Formatter`]
///
/// An object whose type has no caster fails validation with
/// [`FormatterError::Invalid`].
pub struct FormatterRegistry {
    by_name: DashMap<String, TypeRef>,
    casters: DashMap<TypeId, Caster>,
}

impl FormatterRegistry {
    /// Creates a registry with no named formatters that only accepts
    /// `Arc<dyn Formatter>` instances.
    #[must_use]
    pub fn empty() -> Self {
        let casters: DashMap<TypeId, Caster> = DashMap::new();
        casters.insert(TypeId::of::<Arc<dyn Formatter>>(), cast_shared);
        Self {
            by_name: DashMap::new(),
            casters,
        }
    }

    /// Creates a registry with the built-in `plain` and `logstash` formatters.
    #[must_use]
    pub fn with_builtins() -> Self {
        let registry = Self::empty();
        registry.register::<Plain>("plain");
        registry.register::<Logstash>("logstash");
        registry
    }

    /// Register a formatter type under a symbolic name.
    pub fn register<T: Formatter + Default + 'static>(&self, name: &str) {
        self.by_name.insert(type_key(name), TypeRef::formatter::<T>());
        self.allow::<T>();
    }

    /// Accept values of `T` as formatters without giving them a name.
    pub fn allow<T: Formatter + 'static>(&self) {
        self.casters.insert(TypeId::of::<T>(), cast_to::<T>);
    }

    /// Look up a type by symbolic name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<TypeRef> {
        self.by_name.get(&type_key(name)).map(|entry| *entry.value())
    }

    /// Resolve a reference into a validated formatter.
    ///
    /// # Errors
    ///
    /// - [`FormatterError::NotFound`] if a symbolic name is not registered
    /// - [`FormatterError::Invalid`] if the resolved object's type has no registered caster
    pub fn resolve(&self, reference: &FormatterRef) -> Result<Arc<dyn Formatter>, FormatterError> {
        match reference {
            FormatterRef::Named(name) => {
                let type_ref = self.lookup(name).ok_or_else(|| FormatterError::NotFound {
                    name: name.clone(),
                })?;
                self.validate(type_ref.instantiate(), type_ref.type_name(), type_ref.cast)
            }
            FormatterRef::Type(type_ref) => {
                self.validate(type_ref.instantiate(), type_ref.type_name(), type_ref.cast)
            }
            FormatterRef::Instance { object, type_name } => {
                self.validate(Arc::clone(object), type_name, None)
            }
        }
    }

    fn validate(
        &self,
        object: ErasedObject,
        type_name: &str,
        fallback: Option<Caster>,
    ) -> Result<Arc<dyn Formatter>, FormatterError> {
        let type_id = (*object).type_id();
        let caster = self
            .casters
            .get(&type_id)
            .map(|entry| *entry.value())
            .or(fallback);

        caster
            .and_then(|cast| cast(object))
            .ok_or_else(|| FormatterError::Invalid {
                type_name: type_name.to_string(),
            })
    }
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Normalizes a symbolic name: drops a leading `:`, upper-cases the first
/// character and lower-cases the rest.
fn type_key(name: &str) -> String {
    let name = name.strip_prefix(':').unwrap_or(name);
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
