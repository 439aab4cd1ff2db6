//! Short-lived child containers with their own scoped cache and overrides.

use crate::error::{DisposedTarget, Error, Result};
use crate::key::{KeyId, KeyInfo, ServiceKey};
use crate::provider::ServiceProvider;
use crate::registration::{erase, AnyArc, Lifetime};
use crate::resolver::{activate_cached, activate_fresh, ResolutionStack, Resolve, Resolver, Target};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::ReentrantMutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// A child container for one unit of work (a request, a job run, an RPC call).
///
/// Singletons and instances are shared with the root provider. Scoped services
/// are built at most once per scope and are invisible to sibling scopes.
/// Transients resolved here may depend on scoped services.
///
/// Dropping a `Scope` disposes it, so cleanup happens on every exit path.
/// [`dispose`](Self::dispose) does the same thing eagerly.
pub struct Scope {
  id: u64,
  root: ServiceProvider,
  cache: DashMap<KeyId, Arc<OnceCell<AnyArc>>>,
  overrides: DashMap<KeyId, AnyArc>,
  // Serialises first-time scoped construction. Always taken before the
  // root's lock, never after: singletons cannot reach scoped services.
  build_lock: ReentrantMutex<()>,
  disposed: AtomicBool,
}

impl Scope {
  pub(crate) fn new(root: ServiceProvider) -> Self {
    let id = NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed);
    debug!(provider = root.name(), scope = id, "scope created");
    Self {
      id,
      root,
      cache: DashMap::new(),
      overrides: DashMap::new(),
      build_lock: ReentrantMutex::new(()),
      disposed: AtomicBool::new(false),
    }
  }

  fn ensure_live(&self) -> Result<()> {
    if self.disposed.load(Ordering::Acquire) {
      return Err(Error::Disposed {
        target: DisposedTarget::Scope,
      });
    }
    self.root.inner.ensure_live()
  }

  /// Scope-side resolution. `Ok(None)` means the key has neither an override
  /// nor a registration.
  pub(crate) fn resolve_erased(
    &self,
    key: KeyInfo,
    stack: &ResolutionStack,
  ) -> Result<Option<AnyArc>> {
    self.ensure_live()?;

    let overridden = self.overrides.get(&key.id).map(|v| v.value().clone());
    if let Some(value) = overridden {
      trace!(scope = self.id, key = key.name, "resolved from scope override");
      return Ok(Some(value));
    }

    let root = &self.root.inner;
    let Some(registration) = root.registration(key.id) else {
      return Ok(None);
    };
    trace!(
      scope = self.id,
      key = key.name,
      lifetime = %registration.lifetime,
      "resolving from scope"
    );

    match registration.lifetime {
      lifetime if lifetime.is_root_cached() => root.resolve_erased(key, stack),
      Lifetime::Scoped => {
        // Clone the slot out so no map shard stays locked while the factory runs.
        let cell = Arc::clone(self.cache.entry(key.id).or_default().value());
        let resolver = Resolver::new(Target::Scope(self), stack);
        activate_cached(&cell, &self.build_lock, registration, &resolver).map(Some)
      }
      _ => {
        let resolver = Resolver::new(Target::Scope(self), stack);
        activate_fresh(registration, &resolver).map(Some)
      }
    }
  }

  // --- Resolution ---

  pub fn resolve<T>(&self, key: &ServiceKey<T>) -> Result<Arc<T>>
  where
    T: ?Sized + Send + Sync + 'static,
  {
    let stack = ResolutionStack::new();
    Resolver::new(Target::Scope(self), &stack).resolve(key)
  }

  /// Like [`resolve`](Self::resolve), but returns `Ok(None)` when `key` has
  /// neither an override nor a registration.
  pub fn try_resolve<T>(&self, key: &ServiceKey<T>) -> Result<Option<Arc<T>>>
  where
    T: ?Sized + Send + Sync + 'static,
  {
    let stack = ResolutionStack::new();
    Resolver::new(Target::Scope(self), &stack).try_resolve(key)
  }

  // --- Overrides ---

  /// Makes `key` resolve to `value` in this scope only, ahead of any
  /// registration. The key does not need to be registered at all.
  pub fn set_instance<T>(&self, key: &ServiceKey<T>, value: T) -> Result<()>
  where
    T: Send + Sync + 'static,
  {
    self.set_instance_arc(key, Arc::new(value))
  }

  /// [`set_instance`](Self::set_instance) for shared or unsized values.
  pub fn set_instance_arc<T>(&self, key: &ServiceKey<T>, value: Arc<T>) -> Result<()>
  where
    T: ?Sized + Send + Sync + 'static,
  {
    self.ensure_live()?;
    trace!(scope = self.id, key = key.name(), "scope override installed");
    self.overrides.insert(key.id(), erase(value));
    Ok(())
  }

  // --- Lifecycle ---

  /// Disposes the scope and releases its scoped instances and overrides.
  ///
  /// Idempotent. Sibling scopes and the root provider are unaffected.
  pub fn dispose(&self) {
    if self.disposed.swap(true, Ordering::AcqRel) {
      return;
    }
    let released = self.cache.len();
    self.cache.clear();
    self.overrides.clear();
    debug!(
      provider = self.root.name(),
      scope = self.id,
      released,
      "scope disposed"
    );
  }

  pub fn is_disposed(&self) -> bool {
    self.disposed.load(Ordering::Acquire)
  }

  /// The root provider this scope was created from.
  pub fn provider(&self) -> &ServiceProvider {
    &self.root
  }
}

impl Resolve for Scope {
  fn resolve<T>(&self, key: &ServiceKey<T>) -> Result<Arc<T>>
  where
    T: ?Sized + Send + Sync + 'static,
  {
    Scope::resolve(self, key)
  }

  fn try_resolve<T>(&self, key: &ServiceKey<T>) -> Result<Option<Arc<T>>>
  where
    T: ?Sized + Send + Sync + 'static,
  {
    Scope::try_resolve(self, key)
  }
}

impl Drop for Scope {
  fn drop(&mut self) {
    self.dispose();
  }
}

impl fmt::Debug for Scope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Scope")
      .field("id", &self.id)
      .field("provider", &self.root.name())
      .field("cached", &self.cache.len())
      .field("overrides", &self.overrides.len())
      .field("disposed", &self.is_disposed())
      .finish()
  }
}
