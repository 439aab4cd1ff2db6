//! The root container: process-lifetime singleton state and scope creation.

use crate::error::{DisposedTarget, Error, Result};
use crate::key::{KeyId, KeyInfo, ServiceKey};
use crate::options::CollectionOptions;
use crate::registration::{AnyArc, Lifetime, Registration};
use crate::resolver::{activate_cached, activate_fresh, ResolutionStack, Resolve, Resolver, Target};
use crate::scope::Scope;
use once_cell::sync::OnceCell;
use parking_lot::ReentrantMutex;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// A registration paired with its root-level cache slot.
///
/// The slot is only used for singleton and instance registrations. An
/// initialised slot means "computed", whatever the value is.
struct Entry {
  registration: Registration,
  cell: OnceCell<AnyArc>,
}

pub(crate) struct ProviderInner {
  name: Cow<'static, str>,
  entries: HashMap<KeyId, Entry>,
  // Serialises first-time singleton and instance construction.
  build_lock: ReentrantMutex<()>,
  disposed: AtomicBool,
}

impl ProviderInner {
  pub(crate) fn ensure_live(&self) -> Result<()> {
    if self.disposed.load(Ordering::Acquire) {
      return Err(Error::Disposed {
        target: DisposedTarget::Provider,
      });
    }
    Ok(())
  }

  pub(crate) fn registration(&self, id: KeyId) -> Option<&Registration> {
    self.entries.get(&id).map(|entry| &entry.registration)
  }

  /// Root-side resolution. `Ok(None)` means the key has no registration.
  pub(crate) fn resolve_erased(
    &self,
    key: KeyInfo,
    stack: &ResolutionStack,
  ) -> Result<Option<AnyArc>> {
    self.ensure_live()?;
    let Some(entry) = self.entries.get(&key.id) else {
      return Ok(None);
    };
    let registration = &entry.registration;
    trace!(
      provider = %self.name,
      key = key.name,
      lifetime = %registration.lifetime,
      "resolving from root"
    );

    let resolver = Resolver::new(Target::Root(self), stack);
    match registration.lifetime {
      Lifetime::Singleton | Lifetime::Instance => {
        activate_cached(&entry.cell, &self.build_lock, registration, &resolver).map(Some)
      }
      Lifetime::Transient => activate_fresh(registration, &resolver).map(Some),
      Lifetime::Scoped => Err(Error::ScopedFromRoot { key: key.name }),
    }
  }
}

/// The root container produced by
/// [`ServiceCollection::build`](crate::ServiceCollection::build).
///
/// A `ServiceProvider` is a cheap handle; clones share the same registrations,
/// singleton cache and disposed flag. It resolves singletons, instances and
/// transients directly, and hands out [`Scope`]s for everything scoped.
#[derive(Clone)]
pub struct ServiceProvider {
  pub(crate) inner: Arc<ProviderInner>,
}

impl ServiceProvider {
  pub(crate) fn new(options: CollectionOptions, registrations: HashMap<KeyId, Registration>) -> Self {
    let entries: HashMap<KeyId, Entry> = registrations
      .into_iter()
      .map(|(id, registration)| {
        let entry = Entry {
          registration,
          cell: OnceCell::new(),
        };
        (id, entry)
      })
      .collect();

    debug!(
      provider = %options.name,
      services = entries.len(),
      "service provider built"
    );

    Self {
      inner: Arc::new(ProviderInner {
        name: options.name,
        entries,
        build_lock: ReentrantMutex::new(()),
        disposed: AtomicBool::new(false),
      }),
    }
  }

  // --- Resolution ---

  /// Resolves a service from the root.
  ///
  /// Fails with [`Error::ScopedFromRoot`] for scoped registrations; those must
  /// be resolved through a [`Scope`].
  pub fn resolve<T>(&self, key: &ServiceKey<T>) -> Result<Arc<T>>
  where
    T: ?Sized + Send + Sync + 'static,
  {
    let stack = ResolutionStack::new();
    Resolver::new(Target::Root(&self.inner), &stack).resolve(key)
  }

  /// Like [`resolve`](Self::resolve), but returns `Ok(None)` when `key` has no
  /// registration. Every other failure is still reported.
  pub fn try_resolve<T>(&self, key: &ServiceKey<T>) -> Result<Option<Arc<T>>>
  where
    T: ?Sized + Send + Sync + 'static,
  {
    let stack = ResolutionStack::new();
    Resolver::new(Target::Root(&self.inner), &stack).try_resolve(key)
  }

  // --- Scopes ---

  /// Creates a new child scope for one unit of work.
  pub fn create_scope(&self) -> Result<Scope> {
    self.inner.ensure_live()?;
    Ok(Scope::new(self.clone()))
  }

  /// Runs `f` inside a fresh scope and disposes the scope afterwards.
  ///
  /// The scope is released on every exit path: the closure's result is passed
  /// through untouched, and a panic drops (and so disposes) the scope while
  /// unwinding.
  pub fn with_scope<R, E, F>(&self, f: F) -> std::result::Result<R, E>
  where
    F: FnOnce(&Scope) -> std::result::Result<R, E>,
    E: From<Error>,
  {
    let scope = self.create_scope()?;
    let result = f(&scope);
    scope.dispose();
    result
  }

  // --- Lifecycle ---

  /// Invalidates the provider. Later resolutions and scope creations fail
  /// with [`Error::Disposed`]; scopes already handed out stop resolving too.
  ///
  /// Values the provider already produced are not torn down here. They are
  /// dropped once the last handle referencing them goes away.
  pub fn dispose(&self) {
    if !self.inner.disposed.swap(true, Ordering::AcqRel) {
      debug!(provider = %self.inner.name, "service provider disposed");
    }
  }

  pub fn is_disposed(&self) -> bool {
    self.inner.disposed.load(Ordering::Acquire)
  }

  // --- Introspection ---

  pub fn name(&self) -> &str {
    &self.inner.name
  }

  pub fn contains<T: ?Sized + 'static>(&self, key: &ServiceKey<T>) -> bool {
    self.inner.entries.contains_key(&key.id())
  }

  pub fn lifetime_of<T: ?Sized + 'static>(&self, key: &ServiceKey<T>) -> Option<Lifetime> {
    self.inner.registration(key.id()).map(|r| r.lifetime)
  }
}

impl Resolve for ServiceProvider {
  fn resolve<T>(&self, key: &ServiceKey<T>) -> Result<Arc<T>>
  where
    T: ?Sized + Send + Sync + 'static,
  {
    ServiceProvider::resolve(self, key)
  }

  fn try_resolve<T>(&self, key: &ServiceKey<T>) -> Result<Option<Arc<T>>>
  where
    T: ?Sized + Send + Sync + 'static,
  {
    ServiceProvider::try_resolve(self, key)
  }
}

impl fmt::Debug for ServiceProvider {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ServiceProvider")
      .field("name", &self.inner.name)
      .field("services", &self.inner.entries.len())
      .field("disposed", &self.is_disposed())
      .finish()
  }
}
