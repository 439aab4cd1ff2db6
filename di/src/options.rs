//! Configuration for a [`ServiceCollection`](crate::ServiceCollection).

use std::borrow::Cow;

/// How loudly a repeated registration for the same key is reported.
///
/// The later registration always replaces the earlier one; this only picks the
/// log level of the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
  /// Log replacements at `debug` level.
  #[default]
  Replace,
  /// Log replacements at `warn` level.
  Warn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionOptions {
  pub(crate) name: Cow<'static, str>,
  pub(crate) overwrite: OverwritePolicy,
}

impl Default for CollectionOptions {
  fn default() -> Self {
    Self {
      name: Cow::Borrowed("root"),
      overwrite: OverwritePolicy::default(),
    }
  }
}

impl CollectionOptions {
  pub fn new() -> Self {
    Self::default()
  }

  /// Sets the label attached to the built provider's log events.
  pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
    self.name = name.into();
    self
  }

  pub fn overwrite(mut self, policy: OverwritePolicy) -> Self {
    self.overwrite = policy;
    self
  }
}
