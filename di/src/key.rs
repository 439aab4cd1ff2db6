//! Typed service keys.

use std::any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_KEY_ID: AtomicU64 = AtomicU64::new(1);

/// The identity of a [`ServiceKey`], unique for the life of the process.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(u64);

impl KeyId {
  fn next() -> Self {
    KeyId(NEXT_KEY_ID.fetch_add(1, Ordering::Relaxed))
  }
}

impl fmt::Debug for KeyId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "KeyId({})", self.0)
  }
}

/// A unique token standing for "a service of type `T`".
///
/// Every call to [`ServiceKey::new`] mints a fresh identity, so two keys built
/// with the same debug name are still two different registration slots. Keys
/// are cheap to copy and are usually declared once as statics with the
/// [`service_key!`](crate::service_key) macro.
///
/// `T` may be unsized, e.g. `ServiceKey<dyn Greeter>`.
pub struct ServiceKey<T: ?Sized> {
  id: KeyId,
  name: &'static str,
  _marker: PhantomData<fn() -> Box<T>>,
}

impl<T: ?Sized + 'static> ServiceKey<T> {
  /// Creates a new key with a fresh identity.
  pub fn new(name: &'static str) -> Self {
    Self {
      id: KeyId::next(),
      name,
      _marker: PhantomData,
    }
  }

  pub fn id(&self) -> KeyId {
    self.id
  }

  /// The debug name used in logs and error messages.
  pub fn name(&self) -> &'static str {
    self.name
  }

  pub fn type_name(&self) -> &'static str {
    any::type_name::<T>()
  }

  pub(crate) fn info(&self) -> KeyInfo {
    KeyInfo {
      id: self.id,
      name: self.name,
      type_name: any::type_name::<T>(),
    }
  }
}

// Manual impls so that `T` itself need not be `Clone`, `Eq` or `Debug`.
impl<T: ?Sized> Clone for ServiceKey<T> {
  fn clone(&self) -> Self {
    *self
  }
}

impl<T: ?Sized> Copy for ServiceKey<T> {}

impl<T: ?Sized> PartialEq for ServiceKey<T> {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl<T: ?Sized> Eq for ServiceKey<T> {}

impl<T: ?Sized> Hash for ServiceKey<T> {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.id.hash(state);
  }
}

impl<T: ?Sized> fmt::Debug for ServiceKey<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "ServiceKey({}, {:?}, {})",
      self.name,
      self.id,
      any::type_name::<T>()
    )
  }
}

impl<T: ?Sized> fmt::Display for ServiceKey<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name)
  }
}

/// Type-erased key description carried by registrations and the resolution stack.
#[derive(Clone, Copy)]
pub(crate) struct KeyInfo {
  pub(crate) id: KeyId,
  pub(crate) name: &'static str,
  pub(crate) type_name: &'static str,
}

impl fmt::Debug for KeyInfo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Key({}, {:?})", self.name, self.id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn keys_with_same_name_are_distinct() {
    let a = ServiceKey::<String>::new("config");
    let b = ServiceKey::<String>::new("config");

    assert_ne!(a.id(), b.id());
    assert_ne!(a, b);
    assert_eq!(a.name(), b.name());
  }

  #[test]
  fn copies_share_identity() {
    let a = ServiceKey::<u32>::new("port");
    let b = a;

    assert_eq!(a, b);
    assert_eq!(a.id(), b.id());
  }

  #[test]
  fn unsized_keys_report_trait_type() {
    trait Greeter {}
    let key = ServiceKey::<dyn Greeter>::new("greeter");

    assert!(key.type_name().contains("Greeter"));
    assert_eq!(key.to_string(), "greeter");
  }
}
