//! Conversions from implementations to trait-object services

/// A `bind!` macro that implements `From<Impl> for Arc<dyn Trait>` for one or
/// more implementation types, so they can be registered with
/// [`Container::register_type`](crate::Container::register_type).
///
/// # Macro Syntax
/// ```ignore
/// bind! {
///     Impl1 => Trait1,
///     Impl2 => Trait2,
///     …
/// }
/// ```
/// The trait must have `Send + Sync` as supertraits for `Arc<dyn Trait>` to
/// be a valid service type.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use kiln_di::{Container, Lifetime, bind};
///
/// trait Logger: Send + Sync {
///     fn prefix(&self) -> &str;
/// }
///
/// #[derive(Default)]
/// struct ConsoleLogger;
///
/// impl Logger for ConsoleLogger {
///     fn prefix(&self) -> &str { "[console]" }
/// }
///
/// bind! { ConsoleLogger => Logger }
///
/// let container = Container::new();
/// container.register_type::<Arc<dyn Logger>, ConsoleLogger>(Lifetime::Transient).unwrap();
///
/// let logger = container.resolve::<Arc<dyn Logger>>().unwrap();
/// assert_eq!(logger.prefix(), "[console]");
/// ```
#[macro_export]
macro_rules! bind {
    ($($service:ty => $contract:path),* $(,)?) => {
        $(impl ::core::convert::From<$service> for ::std::sync::Arc<dyn $contract> {
            #[inline]
            fn from(service: $service) -> Self {
                ::std::sync::Arc::new(service)
            }
        })*
    };
}

#[cfg(test)]
mod tests {
    use crate::{Container, Lifetime};
    use std::sync::Arc;

    trait Storage: Send + Sync {
        fn kind(&self) -> &'static str;
    }

    trait Notifier: Send + Sync {
        fn channel(&self) -> String;
    }

    #[derive(Default)]
    struct MemoryStorage;

    #[derive(Default)]
    struct EmailNotifier {
        sent: usize,
    }

    impl Storage for MemoryStorage {
        fn kind(&self) -> &'static str {
            "memory"
        }
    }

    impl Notifier for EmailNotifier {
        fn channel(&self) -> String {
            format!("email:{}", self.sent)
        }
    }

    bind! {
        MemoryStorage => Storage,
        EmailNotifier => Notifier,
    }

    #[test]
    fn it_converts_into_trait_objects() {
        let storage: Arc<dyn Storage> = MemoryStorage.into();
        let notifier: Arc<dyn Notifier> = EmailNotifier::default().into();

        assert_eq!(storage.kind(), "memory");
        assert_eq!(notifier.channel(), "email:0");
    }

    #[test]
    fn it_registers_type_mapping() {
        let container = Container::new();
        container.register_type::<Arc<dyn Storage>, MemoryStorage>(Lifetime::Singleton).unwrap();

        let first = container.resolve::<Arc<dyn Storage>>().unwrap();
        let second = container.resolve::<Arc<dyn Storage>>().unwrap();

        assert_eq!(first.kind(), "memory");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn it_creates_fresh_zero_values_for_transient_mapping() {
        let container = Container::new();
        container.register_type::<Arc<dyn Notifier>, EmailNotifier>(Lifetime::Transient).unwrap();

        let first = container.resolve::<Arc<dyn Notifier>>().unwrap();
        let second = container.resolve::<Arc<dyn Notifier>>().unwrap();

        assert_eq!(first.channel(), "email:0");
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn it_maps_concrete_type_to_itself() {
        #[derive(Clone, Default)]
        struct Settings {
            retries: u8,
        }

        let container = Container::new();
        container.register_type::<Settings, Settings>(Lifetime::Transient).unwrap();

        assert_eq!(container.resolve::<Settings>().unwrap().retries, 0);
    }
}
