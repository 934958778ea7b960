//! Generic and raw factories for resolving types

use super::{Instance, key::TypeInfo};
use crate::error::{BoxError, Error};
use std::{
    borrow::Cow,
    fmt::{Debug, Formatter},
    sync::Arc
};

/// Converts a factory's return value into the registered service type.
///
/// Implemented for `T` itself and for `Result<T, E>`, which lets a factory
/// either return the service directly or fail with an error.
pub trait IntoInstance<T> {
    /// Types this value declares as its return list
    fn returns() -> Vec<TypeInfo>;

    /// Extracts the service or the factory error
    fn into_instance(self) -> Result<T, BoxError>;
}

impl<T: Send + Sync + 'static> IntoInstance<T> for T {
    #[inline]
    fn returns() -> Vec<TypeInfo> {
        vec![TypeInfo::of::<T>()]
    }

    #[inline]
    fn into_instance(self) -> Result<T, BoxError> {
        Ok(self)
    }
}

impl<T, E> IntoInstance<T> for Result<T, E>
where
    T: Send + Sync + 'static,
    E: Into<BoxError> + 'static
{
    #[inline]
    fn returns() -> Vec<TypeInfo> {
        vec![TypeInfo::of::<T>(), TypeInfo::error::<E>()]
    }

    #[inline]
    fn into_instance(self) -> Result<T, BoxError> {
        self.map_err(Into::into)
    }
}

/// A trait that describes a generic factory function
/// whose parameters are resolved from the DI container
pub trait GenericFactory<T, Args>: Send + Sync + 'static {
    /// Parameter types, in declaration order
    fn params() -> Vec<TypeInfo>;

    /// Declared return types
    fn returns() -> Vec<TypeInfo>;

    /// Calls the factory with already resolved arguments
    fn call(&self, args: &mut Arguments) -> Result<T, BoxError>;
}

macro_rules! define_generic_factory ({ $($param:ident)* } => {
    impl<F, R, T, $($param,)*> GenericFactory<T, ($($param,)*)> for F
    where
        F: Fn($($param),*) -> R + Send + Sync + 'static,
        R: IntoInstance<T>,
        $($param: Clone + Send + Sync + 'static,)*
    {
        #[inline]
        fn params() -> Vec<TypeInfo> {
            vec![$(TypeInfo::of::<$param>()),*]
        }

        #[inline]
        fn returns() -> Vec<TypeInfo> {
            R::returns()
        }

        #[inline]
        #[allow(non_snake_case, unused_variables)]
        fn call(&self, args: &mut Arguments) -> Result<T, BoxError> {
            $(let $param = args.take::<$param>()?;)*
            (self)($($param),*).into_instance()
        }
    }
});

define_generic_factory! {}
define_generic_factory! { T1 }
define_generic_factory! { T1 T2 }
define_generic_factory! { T1 T2 T3 }
define_generic_factory! { T1 T2 T3 T4 }
define_generic_factory! { T1 T2 T3 T4 T5 }

/// Positional arguments resolved for a single factory call
#[derive(Debug)]
pub struct Arguments {
    values: std::vec::IntoIter<Instance>,
    position: usize,
}

impl Arguments {
    #[inline]
    pub(crate) fn new(values: Vec<Instance>) -> Self {
        Self { values: values.into_iter(), position: 0 }
    }

    /// Takes the next argument as a shared pointer
    pub fn take_shared<T: Send + Sync + 'static>(&mut self) -> Result<Arc<T>, BoxError> {
        let position = self.position;
        self.position += 1;
        self.values
            .next()
            .ok_or_else(|| format!("missing argument #{position}"))?
            .downcast::<T>()
            .map_err(|_| {
                let expected = std::any::type_name::<T>();
                format!("argument #{position} is not of type {expected}").into()
            })
    }

    /// Takes the next argument and clones it out of the container
    #[inline]
    pub fn take<T: Clone + Send + Sync + 'static>(&mut self) -> Result<T, BoxError> {
        self.take_shared::<T>().map(|arg| arg.as_ref().clone())
    }
}

type ApplyFn = Arc<
    dyn Fn(&mut Arguments) -> Result<Instance, BoxError>
    + Send
    + Sync
>;

/// A type-erased factory with an explicitly declared signature.
///
/// Every registration is stored as a `RawFactory`: the container resolves the
/// declared parameters in order and passes them to the apply function.
/// Typed closures are converted automatically; build one by hand to register
/// a factory whose shape is only known at runtime.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use kiln_di::{Container, RawFactory, RegisterOptions};
///
/// #[derive(Clone)]
/// struct Port(u16);
///
/// let container = Container::new();
/// container.register_instance(Port(8080));
///
/// let factory = RawFactory::new(|args| {
///         let port = args.take::<Port>()?;
///         Ok(Arc::new(format!("0.0.0.0:{}", port.0)))
///     })
///     .param::<Port>()
///     .returns::<String>();
///
/// container.register_raw::<String>(factory, RegisterOptions::new()).unwrap();
///
/// assert_eq!(container.resolve::<String>().unwrap(), "0.0.0.0:8080");
/// ```
#[derive(Clone)]
pub struct RawFactory {
    params: Vec<TypeInfo>,
    returns: Vec<TypeInfo>,
    apply: ApplyFn,
}

impl Debug for RawFactory {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawFactory")
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

impl RawFactory {
    /// Creates a factory with no declared parameters or return values
    pub fn new<F>(apply: F) -> Self
    where
        F: Fn(&mut Arguments) -> Result<Instance, BoxError> + Send + Sync + 'static
    {
        Self {
            params: Vec::new(),
            returns: Vec::new(),
            apply: Arc::new(apply)
        }
    }

    /// Converts a typed factory into a raw one
    pub(crate) fn from_generic<T, F, Args>(factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: GenericFactory<T, Args>
    {
        Self {
            params: F::params(),
            returns: F::returns(),
            apply: Arc::new(move |args: &mut Arguments| {
                factory.call(args).map(|service| Arc::new(service) as Instance)
            })
        }
    }

    /// Declares the next parameter, resolved as an unnamed `P`
    #[inline]
    pub fn param<P: ?Sized + 'static>(mut self) -> Self {
        self.params.push(TypeInfo::of::<P>());
        self
    }

    /// Declares the next return value as `R`
    #[inline]
    pub fn returns<R: ?Sized + 'static>(mut self) -> Self {
        self.returns.push(TypeInfo::of::<R>());
        self
    }

    /// Declares the next return value as the error type `E`
    #[inline]
    pub fn returns_error<E: ?Sized + 'static>(mut self) -> Self {
        self.returns.push(TypeInfo::error::<E>());
        self
    }

    /// Returns the declared parameter types
    #[inline]
    pub fn params(&self) -> &[TypeInfo] {
        &self.params
    }

    /// Checks the declared signature against the registered service type
    pub(crate) fn validate(&self, service: &TypeInfo) -> Result<(), Error> {
        let invalid = |message: Cow<'static, str>| Err(Error::invalid_factory(*service, message));
        match self.returns.as_slice() {
            [] => invalid("factory must return a value".into()),
            [_, _, _, ..] => invalid("factory cannot return more than 2 values".into()),
            [first, ..] if first != service => invalid(format!(
                "factory return type {first} is not assignable to {service}").into()
            ),
            [_, second] if !second.is_error() => invalid("second return value must be error".into()),
            _ => Ok(())
        }
    }

    #[inline]
    pub(crate) fn call(&self, args: Vec<Instance>) -> Result<Instance, BoxError> {
        (self.apply)(&mut Arguments::new(args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct X(i32);

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Y(i32);

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Point(X, Y);

    fn signature<T, F, Args>(_: &F) -> (Vec<TypeInfo>, Vec<TypeInfo>)
    where
        F: GenericFactory<T, Args>
    {
        (F::params(), F::returns())
    }

    fn raw<T: Send + Sync + 'static, F, Args>(factory: F) -> RawFactory
    where
        F: GenericFactory<T, Args>
    {
        RawFactory::from_generic::<T, F, Args>(factory)
    }

    #[test]
    fn it_derives_signature_from_closure() {
        let factory = |x: X, y: Y| Point(x, y);

        let (params, returns) = signature::<Point, _, _>(&factory);

        assert_eq!(params, vec![TypeInfo::of::<X>(), TypeInfo::of::<Y>()]);
        assert_eq!(returns, vec![TypeInfo::of::<Point>()]);
    }

    #[test]
    fn it_derives_fallible_signature() {
        let factory = |x: X| -> Result<Point, std::io::Error> { Ok(Point(x, Y(0))) };

        let (params, returns) = signature::<Point, _, _>(&factory);

        assert_eq!(params, vec![TypeInfo::of::<X>()]);
        assert_eq!(returns.len(), 2);
        assert!(returns[1].is_error());
    }

    #[test]
    fn it_calls_with_positional_arguments() {
        let factory = raw::<Point, _, _>(|x: X, y: Y| Point(x, y));

        let point = factory
            .call(vec![Arc::new(X(1)) as Instance, Arc::new(Y(2))])
            .unwrap();

        assert_eq!(point.downcast_ref::<Point>(), Some(&Point(X(1), Y(2))));
    }

    #[test]
    fn it_propagates_factory_error() {
        let factory = raw::<Point, _, _>(|| -> Result<Point, BoxError> { Err("boom".into()) });

        let err = factory.call(Vec::new()).unwrap_err();

        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn it_reports_argument_type_mismatch() {
        let factory = raw::<Point, _, _>(|x: X, y: Y| Point(x, y));

        let err = factory
            .call(vec![Arc::new(Y(2)) as Instance, Arc::new(X(1))])
            .unwrap_err();

        assert!(err.to_string().starts_with("argument #0 is not of type"));
    }

    #[test]
    fn it_reports_missing_argument() {
        let mut args = Arguments::new(vec![Arc::new(X(1)) as Instance]);

        assert_eq!(args.take::<X>().unwrap(), X(1));
        assert_eq!(args.take::<Y>().unwrap_err().to_string(), "missing argument #1");
    }

    #[test]
    fn it_accepts_valid_signatures() {
        let service = TypeInfo::of::<Point>();

        assert!(raw::<Point, _, _>(|| Point(X(0), Y(0))).validate(&service).is_ok());
        assert!(RawFactory::new(|_| Ok(Arc::new(Point(X(0), Y(0)))))
            .returns::<Point>()
            .returns_error::<std::io::Error>()
            .validate(&service)
            .is_ok());
    }

    #[test]
    fn it_rejects_invalid_signatures() {
        let service = TypeInfo::of::<Point>();
        let base = || RawFactory::new(|_| Ok(Arc::new(Point(X(0), Y(0)))));
        let message = |factory: RawFactory| match factory.validate(&service) {
            Err(Error::InvalidFactory { message, .. }) => message.into_owned(),
            other => panic!("expected InvalidFactory, got {other:?}"),
        };

        assert_eq!(message(base()), "factory must return a value");
        assert_eq!(
            message(base().returns::<Point>().returns_error::<BoxError>().returns::<X>()),
            "factory cannot return more than 2 values"
        );
        assert_eq!(
            message(base().returns::<X>()),
            format!("factory return type {} is not assignable to {}", TypeInfo::of::<X>(), service)
        );
        assert_eq!(
            message(base().returns::<Point>().returns::<String>()),
            "second return value must be error"
        );
    }
}
