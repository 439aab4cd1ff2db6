//! The error taxonomy shared by every resolution and lifecycle operation.

use std::fmt;

use thiserror::Error;

/// Which side of the container hierarchy refused a call after disposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisposedTarget {
  Provider,
  Scope,
}

impl fmt::Display for DisposedTarget {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DisposedTarget::Provider => f.write_str("provider"),
      DisposedTarget::Scope => f.write_str("scope"),
    }
  }
}

/// The error type for every fallible `fibre_di` operation.
///
/// All variants describe composition mistakes rather than transient faults;
/// nothing here is worth retrying.
#[derive(Debug, Error)]
pub enum Error {
  #[error("no service registered for key '{key}'")]
  NotRegistered { key: &'static str },

  #[error("scoped service '{key}' cannot be resolved from the root provider; resolve it through a scope")]
  ScopedFromRoot { key: &'static str },

  #[error("circular dependency detected: {}", .chain.join(" -> "))]
  CircularDependency { chain: Vec<&'static str> },

  #[error("the {target} has been disposed")]
  Disposed { target: DisposedTarget },

  #[error("factory for '{key}' failed: {source}")]
  Factory {
    key: &'static str,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("service '{key}' does not hold a value of type {expected}")]
  TypeMismatch {
    key: &'static str,
    expected: &'static str,
  },
}

impl Error {
  /// Wraps a factory's own failure so it can be returned through `?`.
  pub fn factory<E>(key: &'static str, source: E) -> Self
  where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
  {
    Error::Factory {
      key,
      source: source.into(),
    }
  }

  pub fn is_not_registered(&self) -> bool {
    matches!(self, Error::NotRegistered { .. })
  }

  pub fn is_scoped_from_root(&self) -> bool {
    matches!(self, Error::ScopedFromRoot { .. })
  }

  pub fn is_circular(&self) -> bool {
    matches!(self, Error::CircularDependency { .. })
  }

  pub fn is_disposed(&self) -> bool {
    matches!(self, Error::Disposed { .. })
  }
}

/// A specialized `Result` type for `fibre_di` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn circular_message_lists_chain_in_order() {
    let err = Error::CircularDependency {
      chain: vec!["A", "B", "C", "A"],
    };
    assert_eq!(err.to_string(), "circular dependency detected: A -> B -> C -> A");
  }

  #[test]
  fn factory_error_keeps_source() {
    let err = Error::factory("db", "connection refused");
    assert_eq!(err.to_string(), "factory for 'db' failed: connection refused");
    assert!(std::error::Error::source(&err).is_some());
  }
}
