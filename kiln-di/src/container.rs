//! Dependency Injection container and tools

use crate::error::Error;
use self::{
    factory::{GenericFactory, RawFactory},
    key::{ServiceKey, TypeInfo},
    options::{Lifetime, RegisterOptions},
    scope::Scope,
};
use parking_lot::RwLock;
use std::{
    any::Any,
    collections::HashMap,
    fmt::{Debug, Formatter},
    sync::Arc
};

pub mod factory;
pub mod key;
pub mod options;
pub mod scope;

/// A type-erased service instance.
///
/// Always holds a value of the registered service type.
pub type Instance = Arc<
    dyn Any
    + Send
    + Sync
>;

/// Where a registration gets its instances from
enum Source {
    Factory(RawFactory),
    Instance(Instance),
}

struct Registration {
    service: TypeInfo,
    lifetime: Lifetime,
    source: Source,
}

type RegistrationMap = HashMap<ServiceKey, Arc<Registration>>;
type InstanceMap = HashMap<ServiceKey, Instance>;
type ScopeMap = HashMap<String, Scope>;

#[derive(Default)]
struct Inner {
    registrations: RwLock<RegistrationMap>,
    singletons: RwLock<InstanceMap>,
    scopes: RwLock<ScopeMap>,
}

/// Represents a DI container that maps service types to factories or
/// instances and resolves fully wired object graphs.
///
/// The container is a cheap-to-clone handle: every clone shares the same
/// registrations, singleton cache and scopes. All methods take `&self` and
/// may be called concurrently from many threads.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use kiln_di::{Container, RegisterOptions};
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
///
/// impl Greeter for English {
///     fn greet(&self) -> String { "hello".into() }
/// }
///
/// #[derive(Clone)]
/// struct App { greeter: Arc<dyn Greeter> }
///
/// let container = Container::new();
/// container.register_with(
///     || Arc::new(English) as Arc<dyn Greeter>,
///     RegisterOptions::new().as_singleton()
/// ).unwrap();
/// container.register(|greeter: Arc<dyn Greeter>| App { greeter }).unwrap();
///
/// let app = container.resolve::<App>().unwrap();
/// assert_eq!(app.greeter.greet(), "hello");
/// ```
#[derive(Clone, Default)]
pub struct Container {
    inner: Arc<Inner>
}

impl Debug for Container {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("registrations", &self.inner.registrations.read().len())
            .field("singletons", &self.inner.singletons.read().len())
            .field("scopes", &self.inner.scopes.read().len())
            .finish()
    }
}

impl Container {
    /// Creates a new empty DI container
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an unnamed transient factory for `T`.
    ///
    /// Parameters of the factory are resolved from the container as unnamed
    /// services. The factory returns either `T` or `Result<T, E>`.
    #[inline]
    pub fn register<T, F, Args>(&self, factory: F) -> Result<(), Error>
    where
        T: Send + Sync + 'static,
        F: GenericFactory<T, Args>
    {
        self.register_with(factory, RegisterOptions::default())
    }

    /// Registers a factory for `T` with the given lifetime and name.
    ///
    /// Registering the same type and name again replaces the previous
    /// registration, but an instance that was already cached as a singleton or
    /// in a scope stays cached. Call [`Container::clear`] to drop stale instances.
    ///
    /// # Example
    /// ```
    /// use kiln_di::{Container, Lifetime};
    ///
    /// #[derive(Clone, Default)]
    /// struct Config { port: u16 }
    ///
    /// let container = Container::new();
    /// container.register_with(|| Config { port: 8080 }, Lifetime::Singleton).unwrap();
    ///
    /// assert_eq!(container.resolve::<Config>().unwrap().port, 8080);
    /// ```
    #[inline]
    pub fn register_with<T, F, Args>(&self, factory: F, options: impl Into<RegisterOptions>) -> Result<(), Error>
    where
        T: Send + Sync + 'static,
        F: GenericFactory<T, Args>
    {
        self.register_raw::<T>(RawFactory::from_generic::<T, F, Args>(factory), options)
    }

    /// Registers a factory with an explicitly declared signature for `T`.
    ///
    /// Returns [`Error::InvalidFactory`] if the declared return list is empty,
    /// longer than two, does not start with `T`, or has a second value that
    /// is not an error type.
    pub fn register_raw<T>(&self, factory: RawFactory, options: impl Into<RegisterOptions>) -> Result<(), Error>
    where
        T: Send + Sync + 'static
    {
        let service = TypeInfo::of::<T>();
        factory.validate(&service)?;

        let (lifetime, name) = options.into().into_parts();
        let key = ServiceKey::new(service, name);
        let registration = Registration {
            service,
            lifetime,
            source: Source::Factory(factory)
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(service = %key, %lifetime, "registered factory");

        self.inner.registrations
            .write()
            .insert(key, Arc::new(registration));
        Ok(())
    }

    /// Registers an existing unnamed instance of `T` as a singleton
    #[inline]
    pub fn register_instance<T: Send + Sync + 'static>(&self, instance: T) {
        self.register_instance_with(instance, RegisterOptions::default());
    }

    /// Registers an existing instance of `T`.
    ///
    /// The instance is always a singleton, whatever lifetime the options
    /// carry, and is put in the singleton cache right away.
    pub fn register_instance_with<T>(&self, instance: T, options: impl Into<RegisterOptions>)
    where
        T: Send + Sync + 'static
    {
        let service = TypeInfo::of::<T>();
        let (_, name) = options.into().into_parts();
        let key = ServiceKey::new(service, name);
        let instance: Instance = Arc::new(instance);
        let registration = Registration {
            service,
            lifetime: Lifetime::Singleton,
            source: Source::Instance(instance.clone())
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(service = %key, "registered instance");

        let mut registrations = self.inner.registrations.write();
        let mut singletons = self.inner.singletons.write();
        registrations.insert(key.clone(), Arc::new(registration));
        singletons.insert(key, instance);
    }

    /// Maps the service type `I` to the implementation `Impl`.
    ///
    /// Each created instance is `Impl::default()` converted into `I`.
    /// Use the [`bind!`](crate::bind) macro to derive the conversion
    /// from an implementation to `Arc<dyn Trait>`.
    ///
    /// # Example
    /// ```
    /// use std::sync::Arc;
    /// use kiln_di::{Container, Lifetime, bind};
    ///
    /// trait Clock: Send + Sync {
    ///     fn now(&self) -> u64;
    /// }
    ///
    /// #[derive(Default)]
    /// struct FixedClock;
    ///
    /// impl Clock for FixedClock {
    ///     fn now(&self) -> u64 { 42 }
    /// }
    ///
    /// bind! { FixedClock => Clock }
    ///
    /// let container = Container::new();
    /// container.register_type::<Arc<dyn Clock>, FixedClock>(Lifetime::Singleton).unwrap();
    ///
    /// assert_eq!(container.must_resolve::<Arc<dyn Clock>>().now(), 42);
    /// ```
    #[inline]
    pub fn register_type<I, Impl>(&self, options: impl Into<RegisterOptions>) -> Result<(), Error>
    where
        I: Send + Sync + 'static,
        Impl: Default + Into<I> + 'static
    {
        self.register_with::<I, _, ()>(|| -> I { Impl::default().into() }, options)
    }

    /// Returns `true` if an unnamed registration exists for `T`
    #[inline]
    pub fn has<T: ?Sized + 'static>(&self) -> bool {
        self.has_key(&ServiceKey::of::<T>())
    }

    /// Returns `true` if a registration named `name` exists for `T`
    #[inline]
    pub fn has_named<T: ?Sized + 'static>(&self, name: &str) -> bool {
        self.has_key(&ServiceKey::named::<T>(name.to_owned()))
    }

    /// Returns `true` if a registration exists for `key`
    #[inline]
    pub fn has_key(&self, key: &ServiceKey) -> bool {
        self.inner.registrations
            .read()
            .contains_key(key)
    }

    /// Resolves an unnamed service and returns a cloned instance.
    ///
    /// `T` must implement [`Clone`], otherwise use [`Container::resolve_shared`],
    /// which returns a shared pointer.
    #[inline]
    pub fn resolve<T: Clone + Send + Sync + 'static>(&self) -> Result<T, Error> {
        self.resolve_named::<T>("")
    }

    /// Resolves the service registered under `name` and returns a cloned instance
    #[inline]
    pub fn resolve_named<T: Clone + Send + Sync + 'static>(&self, name: &str) -> Result<T, Error> {
        self.resolve_shared_named::<T>(name)
            .map(|s| s.as_ref().clone())
    }

    /// Resolves an unnamed service and returns a shared pointer
    #[inline]
    pub fn resolve_shared<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, Error> {
        self.resolve_shared_named::<T>("")
    }

    /// Resolves the service registered under `name` and returns a shared pointer
    #[inline]
    pub fn resolve_shared_named<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, Error> {
        self.resolve_typed::<T>(name, None)
    }

    /// Resolves an unnamed service within `scope`.
    ///
    /// Scoped services are cached in `scope`; singleton and transient
    /// services behave as usual.
    #[inline]
    pub fn resolve_in_scope<T: Clone + Send + Sync + 'static>(&self, scope: &Scope) -> Result<T, Error> {
        self.resolve_named_in_scope::<T>(scope, "")
    }

    /// Resolves the service registered under `name` within `scope`
    #[inline]
    pub fn resolve_named_in_scope<T>(&self, scope: &Scope, name: &str) -> Result<T, Error>
    where
        T: Clone + Send + Sync + 'static
    {
        self.resolve_typed::<T>(name, Some(scope))
            .map(|s| s.as_ref().clone())
    }

    /// Resolves an unnamed service within `scope` and returns a shared pointer
    #[inline]
    pub fn resolve_shared_in_scope<T: Send + Sync + 'static>(&self, scope: &Scope) -> Result<Arc<T>, Error> {
        self.resolve_typed::<T>("", Some(scope))
    }

    /// Resolves an unnamed service or panics.
    ///
    /// Meant for startup code that has finished all registrations and
    /// treats a missing or broken registration as a bug.
    ///
    /// # Panics
    /// If the resolution fails, with the error message.
    #[inline]
    #[track_caller]
    pub fn must_resolve<T: Clone + Send + Sync + 'static>(&self) -> T {
        match self.resolve::<T>() {
            Ok(service) => service,
            Err(err) => panic!("{err}")
        }
    }

    /// Resolves the service registered under `name` or panics.
    ///
    /// # Panics
    /// If the resolution fails, with the error message.
    #[inline]
    #[track_caller]
    pub fn must_resolve_named<T: Clone + Send + Sync + 'static>(&self, name: &str) -> T {
        match self.resolve_named::<T>(name) {
            Ok(service) => service,
            Err(err) => panic!("{err}")
        }
    }

    /// Creates a new empty scope and stores it under `name`,
    /// replacing any scope with the same name.
    pub fn create_scope(&self, name: impl Into<String>) -> Scope {
        let name = name.into();
        let scope = Scope::new(name.clone());

        #[cfg(feature = "tracing")]
        tracing::debug!(scope = %name, "created scope");

        self.inner.scopes
            .write()
            .insert(name, scope.clone());
        scope
    }

    /// Returns the scope stored under `name`
    pub fn scope(&self, name: &str) -> Result<Scope, Error> {
        self.inner.scopes
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ScopeNotFound(name.to_owned()))
    }

    /// Removes all registrations, cached singletons and scopes.
    ///
    /// Scope handles held by callers stay usable but are no longer
    /// reachable through [`Container::scope`].
    pub fn clear(&self) {
        let mut registrations = self.inner.registrations.write();
        let mut singletons = self.inner.singletons.write();
        let mut scopes = self.inner.scopes.write();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            registrations = registrations.len(),
            singletons = singletons.len(),
            scopes = scopes.len(),
            "clearing container"
        );

        registrations.clear();
        singletons.clear();
        scopes.clear();
    }

    #[inline]
    fn resolve_typed<T: Send + Sync + 'static>(&self, name: &str, scope: Option<&Scope>) -> Result<Arc<T>, Error> {
        let key = ServiceKey::named::<T>(name.to_owned());
        let mut chain = Vec::new();
        self.resolve_key(&key, scope, &mut chain)
            .inspect_err(|_err| {
                #[cfg(feature = "tracing")]
                tracing::debug!(service = %key, "resolution failed: {_err}");
            })
            .and_then(Self::downcast::<T>)
    }

    /// Resolves `key`, threading `chain` through nested resolutions
    /// to detect cycles.
    fn resolve_key(&self, key: &ServiceKey, scope: Option<&Scope>, chain: &mut Vec<TypeInfo>) -> Result<Instance, Error> {
        let registration = self.inner.registrations
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| Error::NotRegistered(key.clone()))?;

        let service = registration.service;
        if chain.contains(&service) {
            let mut cycle = chain.clone();
            cycle.push(service);
            return Err(Error::CircularDependency(cycle));
        }

        let factory = match &registration.source {
            Source::Instance(instance) => return Ok(instance.clone()),
            Source::Factory(factory) => factory
        };

        if let Some(instance) = self.cached(key, registration.lifetime, scope) {
            #[cfg(feature = "tracing")]
            tracing::trace!(service = %key, lifetime = %registration.lifetime, "cache hit");
            return Ok(instance);
        }

        chain.push(service);
        let created = self.invoke(factory, scope, chain);
        chain.pop();

        let instance = created.map_err(|cause| Error::failed(service, cause))?;
        if (*instance).type_id() != service.id() {
            return Err(Error::failed(service, format!("produced instance is not of type {service}")));
        }
        self.store(key, registration.lifetime, scope, &instance);
        Ok(instance)
    }

    /// Resolves the factory parameters in declaration order, then calls it.
    ///
    /// No lock is held while the factory runs.
    fn invoke(&self, factory: &RawFactory, scope: Option<&Scope>, chain: &mut Vec<TypeInfo>) -> Result<Instance, crate::error::BoxError> {
        let mut args = Vec::with_capacity(factory.params().len());
        for param in factory.params() {
            let key = ServiceKey::new(*param, "");
            args.push(self.resolve_key(&key, scope, chain)?);
        }
        factory.call(args)
    }

    #[inline]
    fn cached(&self, key: &ServiceKey, lifetime: Lifetime, scope: Option<&Scope>) -> Option<Instance> {
        match lifetime {
            Lifetime::Singleton => self.inner.singletons.read().get(key).cloned(),
            Lifetime::Scoped => scope.and_then(|scope| scope.get(key)),
            Lifetime::Transient => None
        }
    }

    #[inline]
    fn store(&self, key: &ServiceKey, lifetime: Lifetime, scope: Option<&Scope>, instance: &Instance) {
        match (lifetime, scope) {
            (Lifetime::Singleton, _) => {
                self.inner.singletons
                    .write()
                    .insert(key.clone(), instance.clone());
            },
            (Lifetime::Scoped, Some(scope)) => scope.set(key.clone(), instance.clone()),
            _ => return
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(service = %key, %lifetime, "cached instance");
    }

    #[inline]
    fn downcast<T: Send + Sync + 'static>(instance: Instance) -> Result<Arc<T>, Error> {
        instance
            .downcast::<T>()
            .map_err(|_| {
                let expected = std::any::type_name::<T>();
                Error::failed(TypeInfo::of::<T>(), format!("produced instance is not of type {expected}"))
            })
    }
}
