//! # Fibre DI
//!
//! A scoped, thread-safe service composition container for Rust.
//!
//! Services are registered up front against typed [`ServiceKey`]s, each with
//! an explicit factory and a [`Lifetime`]. The finished [`ServiceCollection`]
//! is frozen into a root [`ServiceProvider`], which lives for the whole
//! process. Each unit of work (a request, a job run, an RPC call) then gets
//! its own [`Scope`].
//!
//! ## Core Concepts
//!
//! - **Singleton**: built once on first use and shared everywhere.
//! - **Scoped**: built once per scope. Resolving one from the root provider,
//!   or from inside a singleton's factory, fails with
//!   [`Error::ScopedFromRoot`], so longer-lived services can never capture it.
//! - **Transient**: built fresh on every resolution.
//! - **Instance**: a pre-built value shared like a singleton.
//!
//! Factories receive a [`Resolver`] and compose their dependencies through
//! it. Missing registrations and circular dependencies are reported as
//! [`Error`]s on first resolution, with the full cycle spelled out.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_di::{service_key, ServiceCollection};
//! use std::sync::Arc;
//!
//! struct Config {
//!   name: String,
//! }
//!
//! service_key! {
//!   static CONFIG: Config;
//!   static GREETER: String;
//!   static REQUEST_ID: u64;
//! }
//!
//! let mut services = ServiceCollection::new();
//! services
//!   .add_singleton(&CONFIG, |_| Ok(Config { name: "World".to_string() }))
//!   .add_transient(&GREETER, |r| {
//!     Ok(format!("Hello, {}!", r.resolve(&CONFIG)?.name))
//!   });
//!
//! let provider = services.build();
//!
//! let scope = provider.create_scope().unwrap();
//! scope.set_instance(&REQUEST_ID, 42).unwrap();
//!
//! assert_eq!(*scope.resolve(&GREETER).unwrap(), "Hello, World!");
//! assert_eq!(*scope.resolve(&REQUEST_ID).unwrap(), 42);
//! assert!(Arc::ptr_eq(
//!   &scope.resolve(&CONFIG).unwrap(),
//!   &provider.resolve(&CONFIG).unwrap(),
//! ));
//!
//! drop(scope);
//! provider.dispose();
//! ```

mod collection;
mod error;
mod key;
mod macros;
mod options;
mod provider;
mod registration;
mod resolver;
mod scope;

pub use collection::ServiceCollection;
pub use error::{DisposedTarget, Error, Result};
pub use key::{KeyId, ServiceKey};
pub use options::{CollectionOptions, OverwritePolicy};
pub use provider::ServiceProvider;
pub use registration::Lifetime;
pub use resolver::{Resolve, Resolver};
pub use scope::Scope;

#[doc(hidden)]
pub mod __private {
  pub use once_cell::sync::Lazy;
}
