//! The registration set: an append-only builder that freezes into a
//! [`ServiceProvider`].

use crate::error::Result;
use crate::key::{KeyId, ServiceKey};
use crate::options::{CollectionOptions, OverwritePolicy};
use crate::provider::ServiceProvider;
use crate::registration::{erase, ErasedFactory, Lifetime, Registration};
use crate::resolver::Resolver;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Collects service registrations before the container is built.
///
/// Every `add_*` method returns `&mut Self` so registrations can be chained in
/// any order. Registering a key that is already present replaces the earlier
/// registration.
///
/// Nothing about the dependency graph is checked here or in
/// [`build`](Self::build); a missing registration or a cycle is reported the
/// first time the affected service is resolved.
///
/// # Examples
///
/// ```
/// use fibre_di::{ServiceCollection, ServiceKey};
///
/// struct Config {
///   name: String,
/// }
///
/// let config = ServiceKey::<Config>::new("Config");
/// let greeting = ServiceKey::<String>::new("Greeting");
///
/// let mut services = ServiceCollection::new();
/// services
///   .add_singleton(&config, |_| Ok(Config { name: "World".into() }))
///   .add_transient(&greeting, move |r| {
///     Ok(format!("Hello, {}!", r.resolve(&config)?.name))
///   });
///
/// let provider = services.build();
/// let scope = provider.create_scope().unwrap();
/// assert_eq!(*scope.resolve(&greeting).unwrap(), "Hello, World!");
/// ```
#[derive(Default)]
pub struct ServiceCollection {
  options: CollectionOptions,
  registrations: HashMap<KeyId, Registration>,
}

impl ServiceCollection {
  /// Creates an empty collection with default options.
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_options(options: CollectionOptions) -> Self {
    Self {
      options,
      registrations: HashMap::new(),
    }
  }

  // --- PRIVATE HELPERS ---

  fn insert(&mut self, registration: Registration) -> &mut Self {
    let key = registration.key;
    let lifetime = registration.lifetime;
    if let Some(previous) = self.registrations.insert(key.id, registration) {
      match self.options.overwrite {
        OverwritePolicy::Replace => debug!(
          key = key.name,
          previous = %previous.lifetime,
          lifetime = %lifetime,
          "registration replaced"
        ),
        OverwritePolicy::Warn => warn!(
          key = key.name,
          previous = %previous.lifetime,
          lifetime = %lifetime,
          "registration replaced"
        ),
      }
    }
    self
  }

  fn add_factory<T, F>(&mut self, key: &ServiceKey<T>, lifetime: Lifetime, factory: F) -> &mut Self
  where
    T: ?Sized + Send + Sync + 'static,
    F: Fn(&Resolver<'_>) -> Result<Arc<T>> + Send + Sync + 'static,
  {
    let erased: ErasedFactory = Box::new(move |resolver| factory(resolver).map(erase));
    self.insert(Registration::factory(key.info(), lifetime, erased))
  }

  // --- Singleton Registration ---

  /// Registers a service built once, on first resolution, and shared by the
  /// provider and every scope.
  ///
  /// The factory receives a root-bound [`Resolver`], so it cannot depend on
  /// scoped services.
  pub fn add_singleton<T, F>(&mut self, key: &ServiceKey<T>, factory: F) -> &mut Self
  where
    T: Send + Sync + 'static,
    F: Fn(&Resolver<'_>) -> Result<T> + Send + Sync + 'static,
  {
    self.add_factory(key, Lifetime::Singleton, move |r| factory(r).map(Arc::new))
  }

  /// Singleton registration for unsized services such as trait objects.
  pub fn add_singleton_arc<T, F>(&mut self, key: &ServiceKey<T>, factory: F) -> &mut Self
  where
    T: ?Sized + Send + Sync + 'static,
    F: Fn(&Resolver<'_>) -> Result<Arc<T>> + Send + Sync + 'static,
  {
    self.add_factory(key, Lifetime::Singleton, factory)
  }

  // --- Scoped Registration ---

  /// Registers a service built at most once per [`Scope`](crate::Scope).
  pub fn add_scoped<T, F>(&mut self, key: &ServiceKey<T>, factory: F) -> &mut Self
  where
    T: Send + Sync + 'static,
    F: Fn(&Resolver<'_>) -> Result<T> + Send + Sync + 'static,
  {
    self.add_factory(key, Lifetime::Scoped, move |r| factory(r).map(Arc::new))
  }

  pub fn add_scoped_arc<T, F>(&mut self, key: &ServiceKey<T>, factory: F) -> &mut Self
  where
    T: ?Sized + Send + Sync + 'static,
    F: Fn(&Resolver<'_>) -> Result<Arc<T>> + Send + Sync + 'static,
  {
    self.add_factory(key, Lifetime::Scoped, factory)
  }

  // --- Transient Registration ---

  /// Registers a service built fresh on every resolution.
  pub fn add_transient<T, F>(&mut self, key: &ServiceKey<T>, factory: F) -> &mut Self
  where
    T: Send + Sync + 'static,
    F: Fn(&Resolver<'_>) -> Result<T> + Send + Sync + 'static,
  {
    self.add_factory(key, Lifetime::Transient, move |r| factory(r).map(Arc::new))
  }

  pub fn add_transient_arc<T, F>(&mut self, key: &ServiceKey<T>, factory: F) -> &mut Self
  where
    T: ?Sized + Send + Sync + 'static,
    F: Fn(&Resolver<'_>) -> Result<Arc<T>> + Send + Sync + 'static,
  {
    self.add_factory(key, Lifetime::Transient, factory)
  }

  // --- Instance Registration ---

  /// Registers a ready-made value, shared like a singleton.
  pub fn add_instance<T>(&mut self, key: &ServiceKey<T>, value: T) -> &mut Self
  where
    T: Send + Sync + 'static,
  {
    self.add_instance_arc(key, Arc::new(value))
  }

  pub fn add_instance_arc<T>(&mut self, key: &ServiceKey<T>, value: Arc<T>) -> &mut Self
  where
    T: ?Sized + Send + Sync + 'static,
  {
    self.insert(Registration::instance(key.info(), erase(value)))
  }

  // --- Inspection ---

  pub fn contains<T: ?Sized + 'static>(&self, key: &ServiceKey<T>) -> bool {
    self.registrations.contains_key(&key.id())
  }

  pub fn lifetime_of<T: ?Sized + 'static>(&self, key: &ServiceKey<T>) -> Option<Lifetime> {
    self.registrations.get(&key.id()).map(|r| r.lifetime)
  }

  pub fn len(&self) -> usize {
    self.registrations.len()
  }

  pub fn is_empty(&self) -> bool {
    self.registrations.is_empty()
  }

  /// Freezes the collection into a root [`ServiceProvider`].
  pub fn build(self) -> ServiceProvider {
    ServiceProvider::new(self.options, self.registrations)
  }
}

impl fmt::Debug for ServiceCollection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ServiceCollection")
      .field("options", &self.options)
      .field("registrations", &self.registrations.len())
      .finish()
  }
}
