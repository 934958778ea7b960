//! Describes dependency injection errors

use crate::container::key::{ServiceKey, TypeInfo};
use std::{
    borrow::Cow,
    fmt::{Display, Formatter},
    sync::Arc
};

/// A boxed error returned by user factories
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A shared, type-erased cause of a failed resolution
pub type Cause = Arc<dyn std::error::Error + Send + Sync>;

/// Errors produced while registering or resolving services
#[derive(Debug, Clone)]
pub enum Error {
    /// No registration exists for the requested type and name
    NotRegistered(ServiceKey),

    /// The resolution chain revisited a type that is still being resolved.
    ///
    /// The last element is the repeated type.
    CircularDependency(Vec<TypeInfo>),

    /// A factory or one of its transitive dependencies failed
    ResolutionFailed {
        /// The service that could not be constructed
        service: TypeInfo,
        /// The underlying failure
        cause: Cause,
    },

    /// A factory signature was rejected at registration time
    InvalidFactory {
        /// The service the factory was registered for
        service: TypeInfo,
        /// Why the factory was rejected
        message: Cow<'static, str>,
    },

    /// No scope with this name exists in the container
    ScopeNotFound(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NotRegistered(key) => write!(f, "DI Error: type {key} is not registered"),
            Error::CircularDependency(chain) => {
                f.write_str("DI Error: circular dependency detected: ")?;
                for (i, service) in chain.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" -> ")?;
                    }
                    Display::fmt(service, f)?;
                }
                Ok(())
            },
            Error::ResolutionFailed { service, cause } => write!(f, "DI Error: failed to resolve {service}: {cause}"),
            Error::InvalidFactory { service, message } => write!(f, "DI Error: invalid factory for {service}: {message}"),
            Error::ScopeNotFound(name) => write!(f, "DI Error: scope {name:?} not found")
        }
    }
}

impl std::error::Error for Error {
    #[inline]
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ResolutionFailed { cause, .. } => Some(cause.as_ref()),
            _ => None
        }
    }
}

impl Error {
    /// Wraps `cause` into [`Error::ResolutionFailed`] for `service`
    #[inline]
    pub fn failed(service: TypeInfo, cause: impl Into<BoxError>) -> Self {
        Error::ResolutionFailed { service, cause: Arc::from(cause.into()) }
    }

    /// Creates an [`Error::InvalidFactory`] for `service`
    #[inline]
    pub fn invalid_factory(service: TypeInfo, message: impl Into<Cow<'static, str>>) -> Self {
        Error::InvalidFactory { service, message: message.into() }
    }

    /// Returns the underlying cause if this is a [`Error::ResolutionFailed`]
    #[inline]
    pub fn cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Error::ResolutionFailed { cause, .. } => Some(cause.as_ref()),
            _ => None
        }
    }

    /// Walks nested [`Error::ResolutionFailed`] wrappers down to the deepest
    /// container error.
    ///
    /// A failure deep in a dependency graph surfaces as a chain of
    /// `ResolutionFailed` errors, one per ancestor. This returns the innermost
    /// [`Error`] of that chain, e.g. the [`Error::NotRegistered`] or
    /// [`Error::CircularDependency`] that started it. If the chain ends with
    /// a factory's own error, the last `ResolutionFailed` is returned.
    pub fn innermost(&self) -> &Error {
        let mut current = self;
        while let Error::ResolutionFailed { cause, .. } = current {
            match cause.downcast_ref::<Error>() {
                Some(inner) => current = inner,
                None => break
            }
        }
        current
    }
}
