//! Public macros for declaring service keys.

/// Declares one or more lazily-initialised static [`ServiceKey`](crate::ServiceKey)s.
///
/// Each key gets a fresh identity the first time it is touched, and its debug
/// name defaults to the static's identifier. An explicit name can be given
/// with `= "name"`.
///
/// The statics deref to `ServiceKey<T>`, so `&KEY` can be passed anywhere a
/// `&ServiceKey<T>` is expected.
///
/// # Examples
///
/// ```
/// use fibre_di::{service_key, ServiceCollection};
///
/// struct Config {
///   port: u16,
/// }
///
/// service_key! {
///   pub static CONFIG: Config;
///   static PORT: u16 = "http.port";
/// }
///
/// let mut services = ServiceCollection::new();
/// services
///   .add_instance(&CONFIG, Config { port: 8080 })
///   .add_singleton(&PORT, |r| Ok(r.resolve(&CONFIG)?.port));
///
/// let provider = services.build();
/// assert_eq!(*provider.resolve(&PORT).unwrap(), 8080);
/// assert_eq!(PORT.name(), "http.port");
/// assert_eq!(CONFIG.name(), "CONFIG");
/// ```
#[macro_export]
macro_rules! service_key {
    // Arm with an explicit debug name: static KEY: Type = "name";
    ($(#[$attr:meta])* $vis:vis static $key:ident : $ty:ty = $name:expr ; $($rest:tt)*) => {
        $(#[$attr])*
        $vis static $key: $crate::__private::Lazy<$crate::ServiceKey<$ty>> =
            $crate::__private::Lazy::new(|| $crate::ServiceKey::new($name));
        $crate::service_key!($($rest)*);
    };

    // Arm using the identifier as the debug name: static KEY: Type;
    ($(#[$attr:meta])* $vis:vis static $key:ident : $ty:ty ; $($rest:tt)*) => {
        $(#[$attr])*
        $vis static $key: $crate::__private::Lazy<$crate::ServiceKey<$ty>> =
            $crate::__private::Lazy::new(|| $crate::ServiceKey::new(stringify!($key)));
        $crate::service_key!($($rest)*);
    };

    () => {};
}
