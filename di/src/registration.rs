//! Lifetime policies and the type-erased registration record.

use crate::error::{Error, Result};
use crate::key::KeyInfo;
use crate::resolver::Resolver;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// An erased service value. The concrete payload is always an `Arc<T>` for the
/// key's `T`, which lets unsized services (`dyn Trait`) travel through the
/// same storage as sized ones.
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

pub(crate) type ErasedFactory = Box<dyn Fn(&Resolver<'_>) -> Result<AnyArc> + Send + Sync>;

/// How many instances of a service exist and how long each one lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
  /// Built once on first resolution and shared by the provider and every scope.
  Singleton,
  /// Built once per scope; cannot be resolved from the root provider.
  Scoped,
  /// Built fresh on every resolution; never cached.
  Transient,
  /// A pre-built value shared like a singleton.
  Instance,
}

impl Lifetime {
  /// Whether values of this lifetime live in the root provider's cache.
  pub(crate) fn is_root_cached(self) -> bool {
    matches!(self, Lifetime::Singleton | Lifetime::Instance)
  }
}

impl fmt::Display for Lifetime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Lifetime::Singleton => "singleton",
      Lifetime::Scoped => "scoped",
      Lifetime::Transient => "transient",
      Lifetime::Instance => "instance",
    };
    f.write_str(s)
  }
}

pub(crate) enum Activator {
  Factory(ErasedFactory),
  Value(AnyArc),
}

pub(crate) struct Registration {
  pub(crate) key: KeyInfo,
  pub(crate) lifetime: Lifetime,
  pub(crate) activator: Activator,
}

impl Registration {
  pub(crate) fn factory(key: KeyInfo, lifetime: Lifetime, factory: ErasedFactory) -> Self {
    Self {
      key,
      lifetime,
      activator: Activator::Factory(factory),
    }
  }

  pub(crate) fn instance(key: KeyInfo, value: AnyArc) -> Self {
    Self {
      key,
      lifetime: Lifetime::Instance,
      activator: Activator::Value(value),
    }
  }

  /// Produces a value for this registration, invoking the factory if there is one.
  ///
  /// Caching and cycle bookkeeping are the caller's job.
  pub(crate) fn activate(&self, resolver: &Resolver<'_>) -> Result<AnyArc> {
    match &self.activator {
      Activator::Factory(factory) => factory(resolver),
      Activator::Value(value) => Ok(value.clone()),
    }
  }
}

impl fmt::Debug for Registration {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Registration")
      .field("key", &self.key)
      .field("lifetime", &self.lifetime)
      .finish()
  }
}

/// Erases an `Arc<T>` into the shared storage representation.
pub(crate) fn erase<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> AnyArc {
  Arc::new(value)
}

/// Recovers the `Arc<T>` stored by [`erase`].
pub(crate) fn unerase<T: ?Sized + Send + Sync + 'static>(
  key: &KeyInfo,
  value: &AnyArc,
) -> Result<Arc<T>> {
  value
    .downcast_ref::<Arc<T>>()
    .cloned()
    .ok_or(Error::TypeMismatch {
      key: key.name,
      expected: key.type_name,
    })
}
