//! The resolution capability handed to factories, and the per-call stack that
//! detects circular dependencies.

use crate::error::{Error, Result};
use crate::key::{KeyInfo, ServiceKey};
use crate::provider::ProviderInner;
use crate::registration::{unerase, AnyArc, Registration};
use crate::scope::Scope;
use once_cell::sync::OnceCell;
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::sync::Arc;
use tracing::debug;

/// The keys currently being activated within one top-level resolve call.
///
/// Created fresh by every `resolve`/`try_resolve` on a provider or scope and
/// dropped when that call returns.
pub(crate) struct ResolutionStack {
  frames: RefCell<Vec<KeyInfo>>,
}

impl ResolutionStack {
  pub(crate) fn new() -> Self {
    Self {
      frames: RefCell::new(Vec::new()),
    }
  }

  /// Pushes `key`, failing if it is already being activated further up.
  pub(crate) fn enter(&self, key: KeyInfo) -> Result<StackGuard<'_>> {
    let mut frames = self.frames.borrow_mut();
    if let Some(pos) = frames.iter().position(|k| k.id == key.id) {
      let mut chain: Vec<&'static str> = frames[pos..].iter().map(|k| k.name).collect();
      chain.push(key.name);
      return Err(Error::CircularDependency { chain });
    }
    frames.push(key);
    Ok(StackGuard { stack: self })
  }

  #[cfg(test)]
  fn depth(&self) -> usize {
    self.frames.borrow().len()
  }
}

/// Pops its frame when dropped, so the stack unwinds on errors and panics alike.
pub(crate) struct StackGuard<'a> {
  stack: &'a ResolutionStack,
}

impl Drop for StackGuard<'_> {
  fn drop(&mut self) {
    self.stack.frames.borrow_mut().pop();
  }
}

#[derive(Clone, Copy)]
pub(crate) enum Target<'a> {
  Root(&'a ProviderInner),
  Scope(&'a Scope),
}

/// Resolves services on behalf of a running factory.
///
/// A `Resolver` is bound either to the root provider or to a scope, depending
/// on where the service being built lives:
///
/// - singleton factories, and transient factories resolved from the root, get
///   a root-bound resolver and therefore cannot reach scoped services;
/// - scoped factories, and transient factories resolved from a scope, get a
///   scope-bound resolver.
///
/// The resolver borrows the current call's resolution stack, so it cannot be
/// stored by the factory.
pub struct Resolver<'a> {
  target: Target<'a>,
  stack: &'a ResolutionStack,
}

impl<'a> Resolver<'a> {
  pub(crate) fn new(target: Target<'a>, stack: &'a ResolutionStack) -> Self {
    Self { target, stack }
  }

  /// Resolves a required dependency.
  pub fn resolve<T>(&self, key: &ServiceKey<T>) -> Result<Arc<T>>
  where
    T: ?Sized + Send + Sync + 'static,
  {
    let info = key.info();
    match self.resolve_erased(info)? {
      Some(value) => unerase(&info, &value),
      None => Err(Error::NotRegistered { key: info.name }),
    }
  }

  /// Resolves an optional dependency; `Ok(None)` if the key is not registered.
  pub fn try_resolve<T>(&self, key: &ServiceKey<T>) -> Result<Option<Arc<T>>>
  where
    T: ?Sized + Send + Sync + 'static,
  {
    let info = key.info();
    match self.resolve_erased(info)? {
      Some(value) => unerase(&info, &value).map(Some),
      None => Ok(None),
    }
  }

  /// Whether this resolver can reach scoped services.
  pub fn is_scoped(&self) -> bool {
    matches!(self.target, Target::Scope(_))
  }

  pub(crate) fn stack(&self) -> &'a ResolutionStack {
    self.stack
  }

  fn resolve_erased(&self, key: KeyInfo) -> Result<Option<AnyArc>> {
    match self.target {
      Target::Root(root) => root.resolve_erased(key, self.stack),
      Target::Scope(scope) => scope.resolve_erased(key, self.stack),
    }
  }
}

/// The capability shared by [`ServiceProvider`](crate::ServiceProvider),
/// [`Scope`] and [`Resolver`]: look up a value for a key.
pub trait Resolve {
  fn resolve<T>(&self, key: &ServiceKey<T>) -> Result<Arc<T>>
  where
    T: ?Sized + Send + Sync + 'static;

  fn try_resolve<T>(&self, key: &ServiceKey<T>) -> Result<Option<Arc<T>>>
  where
    T: ?Sized + Send + Sync + 'static;
}

impl Resolve for Resolver<'_> {
  fn resolve<T>(&self, key: &ServiceKey<T>) -> Result<Arc<T>>
  where
    T: ?Sized + Send + Sync + 'static,
  {
    Resolver::resolve(self, key)
  }

  fn try_resolve<T>(&self, key: &ServiceKey<T>) -> Result<Option<Arc<T>>>
  where
    T: ?Sized + Send + Sync + 'static,
  {
    Resolver::try_resolve(self, key)
  }
}

// --- ACTIVATION HELPERS ---

/// Returns the cached value in `cell`, running the factory once if it is empty.
///
/// First-time construction runs under `build_lock`, one per container, so a
/// whole dependency chain is built by a single thread on a single stack. A
/// cycle entered from two threads at once is then still reported by whichever
/// thread holds the lock, instead of each thread blocking in the other's cell.
/// The lock is reentrant because the chain re-enters it for every cached
/// dependency it builds.
pub(crate) fn activate_cached(
  cell: &OnceCell<AnyArc>,
  build_lock: &ReentrantMutex<()>,
  registration: &Registration,
  resolver: &Resolver<'_>,
) -> Result<AnyArc> {
  if let Some(value) = cell.get() {
    return Ok(value.clone());
  }
  let _build = build_lock.lock();
  // Another thread may have finished the value while we waited.
  if let Some(value) = cell.get() {
    return Ok(value.clone());
  }
  let _guard = resolver.stack().enter(registration.key)?;
  cell
    .get_or_try_init(|| {
      debug!(
        key = registration.key.name,
        lifetime = %registration.lifetime,
        scoped = resolver.is_scoped(),
        "creating service instance"
      );
      registration.activate(resolver)
    })
    .cloned()
}

/// Runs the factory without caching the result.
pub(crate) fn activate_fresh(registration: &Registration, resolver: &Resolver<'_>) -> Result<AnyArc> {
  let _guard = resolver.stack().enter(registration.key)?;
  registration.activate(resolver)
}
