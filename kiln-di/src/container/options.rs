//! Registration options

use std::{
    borrow::Cow,
    fmt::{Display, Formatter}
};

/// Defines how long a resolved instance lives
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// A new instance is created on every resolution
    #[default]
    Transient,

    /// One instance is shared by the whole container
    Singleton,

    /// One instance per [`Scope`](super::Scope).
    ///
    /// Outside a scope this behaves like [`Lifetime::Transient`].
    Scoped,
}

impl Display for Lifetime {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Lifetime::Transient => "Transient",
            Lifetime::Singleton => "Singleton",
            Lifetime::Scoped => "Scoped",
        })
    }
}

/// Configures a registration
///
/// # Example
/// ```
/// use kiln_di::{Lifetime, RegisterOptions};
///
/// let options = RegisterOptions::new()
///     .as_singleton()
///     .with_name("primary");
///
/// assert_eq!(options.lifetime(), Lifetime::Singleton);
/// assert_eq!(options.name(), "primary");
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RegisterOptions {
    /// Lifetime of resolved instances
    ///
    /// Default: [`Lifetime::Transient`]
    lifetime: Lifetime,

    /// Registration name, empty for the unnamed registration
    ///
    /// Default: `""`
    name: Cow<'static, str>,
}

impl RegisterOptions {
    /// Creates default options
    ///
    /// Defaults:
    /// - lifetime: [`Lifetime::Transient`]
    /// - name: `""`
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new instance on every resolution
    #[inline]
    pub fn as_transient(self) -> Self {
        self.with_lifetime(Lifetime::Transient)
    }

    /// Shares a single instance across the container
    #[inline]
    pub fn as_singleton(self) -> Self {
        self.with_lifetime(Lifetime::Singleton)
    }

    /// Shares a single instance per scope
    #[inline]
    pub fn as_scoped(self) -> Self {
        self.with_lifetime(Lifetime::Scoped)
    }

    /// Sets the lifetime explicitly
    #[inline]
    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Registers under `name`, so it can be resolved with
    /// [`Container::resolve_named`](super::Container::resolve_named)
    #[inline]
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns the configured lifetime
    #[inline]
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Returns the configured name
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub(crate) fn into_parts(self) -> (Lifetime, Cow<'static, str>) {
        (self.lifetime, self.name)
    }
}

impl From<Lifetime> for RegisterOptions {
    #[inline]
    fn from(lifetime: Lifetime) -> Self {
        Self::new().with_lifetime(lifetime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_defaults_to_unnamed_transient() {
        let options = RegisterOptions::default();

        assert_eq!(options.lifetime(), Lifetime::Transient);
        assert_eq!(options.name(), "");
    }

    #[test]
    fn it_keeps_last_lifetime() {
        let options = RegisterOptions::new()
            .as_scoped()
            .as_singleton();

        assert_eq!(options.lifetime(), Lifetime::Singleton);
    }

    #[test]
    fn it_converts_from_lifetime() {
        let options: RegisterOptions = Lifetime::Scoped.into();

        assert_eq!(options, RegisterOptions::new().as_scoped());
    }

    #[test]
    fn it_formats_lifetimes() {
        assert_eq!(Lifetime::Transient.to_string(), "Transient");
        assert_eq!(Lifetime::Singleton.to_string(), "Singleton");
        assert_eq!(Lifetime::Scoped.to_string(), "Scoped");
    }
}
