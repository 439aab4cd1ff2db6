use fibre_di::{Error, Lifetime, ServiceCollection, ServiceKey};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

// --- Test Fixtures ---

trait Greeter: Send + Sync {
  fn greet(&self) -> String;
}

struct EnglishGreeter;
impl Greeter for EnglishGreeter {
  fn greet(&self) -> String {
    "Hello!".to_string()
  }
}

#[derive(Debug, PartialEq, Eq)]
struct SimpleService {
  id: u32,
}

struct Config {
  name: String,
}

// --- Basic Tests ---

#[test]
fn test_singleton_resolves_same_instance() {
  // Arrange
  let key = ServiceKey::<SimpleService>::new("simple");
  let mut services = ServiceCollection::new();
  services.add_singleton(&key, |_| Ok(SimpleService { id: 101 }));
  let provider = services.build();

  // Act
  let r1 = provider.resolve(&key).unwrap();
  let r2 = provider.resolve(&key).unwrap();

  // Assert
  assert_eq!(r1.id, 101);
  assert!(Arc::ptr_eq(&r1, &r2));
}

#[test]
fn test_singleton_factory_runs_once_even_when_value_is_absent() {
  static CALLS: AtomicUsize = AtomicUsize::new(0);

  // Arrange
  let key = ServiceKey::<Option<String>>::new("maybe");
  let mut services = ServiceCollection::new();
  services.add_singleton(&key, |_| {
    CALLS.fetch_add(1, Ordering::SeqCst);
    Ok(None)
  });
  let provider = services.build();
  let scope = provider.create_scope().unwrap();

  // Act
  let r1 = provider.resolve(&key).unwrap();
  let r2 = provider.resolve(&key).unwrap();
  let r3 = scope.resolve(&key).unwrap();

  // Assert
  assert!(r1.is_none());
  assert!(Arc::ptr_eq(&r1, &r2));
  assert!(Arc::ptr_eq(&r1, &r3));
  assert_eq!(CALLS.load(Ordering::SeqCst), 1);
}

#[test]
fn test_transient_resolves_distinct_instances() {
  static CALLS: AtomicUsize = AtomicUsize::new(0);

  // Arrange
  let key = ServiceKey::<SimpleService>::new("transient");
  let mut services = ServiceCollection::new();
  services.add_transient(&key, |_| {
    let id = CALLS.fetch_add(1, Ordering::SeqCst) as u32;
    Ok(SimpleService { id })
  });
  let provider = services.build();

  // Act
  let resolved: Vec<_> = (0..5).map(|_| provider.resolve(&key).unwrap()).collect();

  // Assert
  assert_eq!(CALLS.load(Ordering::SeqCst), 5);
  for (i, a) in resolved.iter().enumerate() {
    assert_eq!(a.id, i as u32);
    for b in &resolved[i + 1..] {
      assert!(!Arc::ptr_eq(a, b));
    }
  }
}

#[test]
fn test_instance_is_returned_as_registered() {
  // Arrange
  let key = ServiceKey::<Arc<String>>::new("shared");
  let shared = Arc::new("shared config data".to_string());
  let mut services = ServiceCollection::new();
  services.add_instance(&key, shared.clone());
  let provider = services.build();

  // Act
  let resolved = provider.resolve(&key).unwrap();

  // Assert
  assert!(Arc::ptr_eq(&shared, &resolved));
}

#[test]
fn test_trait_object_registration() {
  // Arrange
  let singleton = ServiceKey::<dyn Greeter>::new("greeter");
  let instance = ServiceKey::<dyn Greeter>::new("greeter.instance");
  let mut services = ServiceCollection::new();
  services
    .add_singleton_arc(&singleton, |_| Ok(Arc::new(EnglishGreeter) as Arc<dyn Greeter>))
    .add_instance_arc(&instance, Arc::new(EnglishGreeter) as Arc<dyn Greeter>);
  let provider = services.build();

  // Act
  let greeter = provider.resolve(&singleton).unwrap();

  // Assert
  assert_eq!(greeter.greet(), "Hello!");
  assert_eq!(provider.resolve(&instance).unwrap().greet(), "Hello!");
  assert!(Arc::ptr_eq(&greeter, &provider.resolve(&singleton).unwrap()));
}

#[test]
fn test_greeter_scenario() {
  // Arrange
  let config = ServiceKey::<Config>::new("Config");
  let greeter = ServiceKey::<String>::new("Greeter");
  let mut services = ServiceCollection::new();
  services
    .add_singleton(&config, |_| Ok(Config { name: "World".to_string() }))
    .add_transient(&greeter, move |r| {
      Ok(format!("Hello, {}!", r.resolve(&config)?.name))
    });
  let provider = services.build();

  // Act & Assert
  for _ in 0..3 {
    let scope = provider.create_scope().unwrap();
    assert_eq!(*scope.resolve(&greeter).unwrap(), "Hello, World!");
    assert!(Arc::ptr_eq(
      &scope.resolve(&config).unwrap(),
      &provider.resolve(&config).unwrap()
    ));
  }
}

#[test]
fn test_unregistered_key() {
  // Arrange
  let missing = ServiceKey::<SimpleService>::new("missing");
  let provider = ServiceCollection::new().build();
  let scope = provider.create_scope().unwrap();

  // Act & Assert
  let err = provider.resolve(&missing).unwrap_err();
  assert!(matches!(err, Error::NotRegistered { key: "missing" }));
  assert!(provider.try_resolve(&missing).unwrap().is_none());

  assert!(scope.resolve(&missing).unwrap_err().is_not_registered());
  assert!(scope.try_resolve(&missing).unwrap().is_none());
}

#[test]
fn test_try_resolve_reports_missing_nested_dependency() {
  // Only the requested key being absent is quiet; a missing dependency is a bug.
  let missing = ServiceKey::<u32>::new("missing");
  let outer = ServiceKey::<u32>::new("outer");
  let mut services = ServiceCollection::new();
  services.add_singleton(&outer, move |r| Ok(*r.resolve(&missing)? + 1));
  let provider = services.build();

  let err = provider.try_resolve(&outer).unwrap_err();
  assert!(matches!(err, Error::NotRegistered { key: "missing" }));
}

#[test]
fn test_keys_with_same_name_are_separate_registrations() {
  // Arrange
  let first = ServiceKey::<String>::new("name");
  let second = ServiceKey::<String>::new("name");
  let mut services = ServiceCollection::new();
  services.add_instance(&first, "first".to_string());
  let provider = services.build();

  // Act & Assert
  assert_eq!(*provider.resolve(&first).unwrap(), "first");
  assert!(provider.try_resolve(&second).unwrap().is_none());
}

#[test]
fn test_overwriting_registration_is_successful() {
  // Arrange
  let key = ServiceKey::<String>::new("overwrite");
  let mut services = ServiceCollection::new();
  services
    .add_instance(&key, "first value".to_string())
    .add_transient(&key, |_| Ok("second value".to_string()));
  let provider = services.build();

  // Act & Assert
  assert_eq!(provider.lifetime_of(&key), Some(Lifetime::Transient));
  assert_eq!(*provider.resolve(&key).unwrap(), "second value");
}

#[test]
fn test_factory_error_is_propagated_and_not_cached() {
  static CALLS: AtomicUsize = AtomicUsize::new(0);

  // Arrange
  let key = ServiceKey::<String>::new("flaky");
  let mut services = ServiceCollection::new();
  services.add_singleton(&key, |_| {
    if CALLS.fetch_add(1, Ordering::SeqCst) == 0 {
      Err(Error::factory("flaky", "connection refused"))
    } else {
      Ok("connected".to_string())
    }
  });
  let provider = services.build();

  // Act
  let first = provider.resolve(&key);
  let second = provider.resolve(&key);

  // Assert
  assert!(matches!(first, Err(Error::Factory { key: "flaky", .. })));
  assert_eq!(*second.unwrap(), "connected");
  assert_eq!(CALLS.load(Ordering::SeqCst), 2);
}

#[test]
fn test_introspection() {
  let singleton = ServiceKey::<u8>::new("singleton");
  let scoped = ServiceKey::<u8>::new("scoped");
  let unknown = ServiceKey::<u8>::new("unknown");
  let mut services = ServiceCollection::new();
  services
    .add_singleton(&singleton, |_| Ok(1))
    .add_scoped(&scoped, |_| Ok(2));
  assert_eq!(services.len(), 2);
  assert!(!services.is_empty());

  let provider = services.build();

  assert_eq!(provider.name(), "root");
  assert!(provider.contains(&singleton));
  assert!(!provider.contains(&unknown));
  assert_eq!(provider.lifetime_of(&scoped), Some(Lifetime::Scoped));
  assert_eq!(provider.lifetime_of(&unknown), None);
}
