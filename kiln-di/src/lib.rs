//! Thread-safe dependency injection container
//!
//! Services are registered on a [`Container`] as factories or ready-made
//! instances, each with a [`Lifetime`]: transient (new instance per
//! resolution), singleton (one per container) or scoped (one per [`Scope`]).
//! Factory parameters are resolved from the container by type, so whole
//! object graphs are wired on demand. Circular dependencies are reported as
//! [`Error::CircularDependency`](error::Error::CircularDependency).
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use kiln_di::{Container, Lifetime};
//!
//! #[derive(Clone)]
//! struct Config { url: String }
//!
//! #[derive(Clone)]
//! struct Database { url: String }
//!
//! let container = Container::new();
//! container.register_instance(Config { url: "postgres://localhost".into() });
//! container.register_with(|cfg: Config| Database { url: cfg.url }, Lifetime::Singleton).unwrap();
//!
//! let db = container.resolve_shared::<Database>().unwrap();
//! let again = container.resolve_shared::<Database>().unwrap();
//!
//! assert_eq!(db.url, "postgres://localhost");
//! assert!(Arc::ptr_eq(&db, &again));
//! ```

pub use crate::{
    container::{
        Container,
        Instance,
        factory::{Arguments, GenericFactory, IntoInstance, RawFactory},
        key::{ServiceKey, TypeInfo},
        options::{Lifetime, RegisterOptions},
        scope::Scope,
    },
    error::{BoxError, Error},
};

pub mod error;
pub mod container;
mod bind;
