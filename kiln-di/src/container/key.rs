//! Type tags and registration keys

use std::{
    any::TypeId,
    borrow::Cow,
    fmt::{Debug, Display, Formatter},
    hash::{Hash, Hasher}
};

/// A comparable tag for a Rust type, used as the key of every registration.
///
/// Equality and hashing consider the [`TypeId`] only. The type name is kept
/// for diagnostics, and the error flag marks a type as error-shaped when it
/// appears in a factory's return list.
#[derive(Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
    error: bool,
}

impl TypeInfo {
    /// Creates a tag for `T`
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            error: false,
        }
    }

    /// Creates a tag for `E` that is flagged as an error type
    #[inline]
    pub fn error<E: ?Sized + 'static>() -> Self {
        Self { error: true, ..Self::of::<E>() }
    }

    /// Returns the [`TypeId`] of the tagged type
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the name of the tagged type
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if the tagged type was declared as an error type
    #[inline]
    pub fn is_error(&self) -> bool {
        self.error
    }
}

impl PartialEq for TypeInfo {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Debug for TypeInfo {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

impl Display for TypeInfo {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// Identifies a registration by its service type and an optional name.
///
/// Unnamed registrations use an empty name.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ServiceKey {
    service: TypeInfo,
    name: Cow<'static, str>,
}

impl ServiceKey {
    /// Creates a key from a type tag and a name
    #[inline]
    pub fn new(service: TypeInfo, name: impl Into<Cow<'static, str>>) -> Self {
        Self { service, name: name.into() }
    }

    /// Creates an unnamed key for `T`
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(TypeInfo::of::<T>(), "")
    }

    /// Creates a named key for `T`
    #[inline]
    pub fn named<T: ?Sized + 'static>(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(TypeInfo::of::<T>(), name)
    }

    /// Returns the service type tag
    #[inline]
    pub fn service(&self) -> &TypeInfo {
        &self.service
    }

    /// Returns the registration name, empty for unnamed registrations
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if this key has a non-empty name
    #[inline]
    pub fn is_named(&self) -> bool {
        !self.name.is_empty()
    }
}

impl Debug for ServiceKey {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for ServiceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_named() {
            write!(f, "{} ({:?})", self.service, self.name)
        } else {
            Display::fmt(&self.service, f)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    trait Logger {}

    #[test]
    fn it_compares_type_info_by_type_id() {
        assert_eq!(TypeInfo::of::<String>(), TypeInfo::of::<String>());
        assert_eq!(TypeInfo::of::<std::io::Error>(), TypeInfo::error::<std::io::Error>());
        assert_ne!(TypeInfo::of::<String>(), TypeInfo::of::<&'static str>());
    }

    #[test]
    fn it_flags_error_types() {
        assert!(TypeInfo::error::<std::io::Error>().is_error());
        assert!(!TypeInfo::of::<std::io::Error>().is_error());
    }

    #[test]
    fn it_tags_unsized_types() {
        let info = TypeInfo::of::<dyn Logger>();

        assert_eq!(info.id(), TypeId::of::<dyn Logger>());
        assert!(info.name().contains("Logger"));
    }

    #[test]
    fn it_distinguishes_keys_by_name() {
        let mut keys = HashSet::new();
        keys.insert(ServiceKey::of::<String>());
        keys.insert(ServiceKey::named::<String>("primary"));
        keys.insert(ServiceKey::named::<String>(String::from("primary")));
        keys.insert(ServiceKey::new(TypeInfo::of::<String>(), ""));

        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn it_formats_keys() {
        assert_eq!(ServiceKey::of::<u32>().to_string(), "u32");
        assert_eq!(ServiceKey::named::<u32>("port").to_string(), "u32 (\"port\")");
        assert!(!ServiceKey::of::<u32>().is_named());
    }
}
