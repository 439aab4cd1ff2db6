use fibre_di::{service_key, ServiceCollection};
use std::sync::Arc;

struct Config {
  name: String,
}

service_key! {
  static CONFIG: Config;
  static GREETER: String;
}

fn main() -> fibre_di::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::TRACE)
    .init();

  let mut services = ServiceCollection::new();
  services
    .add_singleton(&CONFIG, |_| {
      println!("Creating SINGLETON Config...");
      Ok(Config {
        name: "World".to_string(),
      })
    })
    .add_transient(&GREETER, |r| {
      println!("Creating TRANSIENT greeting...");
      Ok(format!("Hello, {}!", r.resolve(&CONFIG)?.name))
    });
  let provider = services.build();

  for request in 0..3 {
    let scope = provider.create_scope()?;
    let greeting = scope.resolve(&GREETER)?;
    println!("Request {}: {}", request, greeting);
    assert_eq!(*greeting, "Hello, World!");
  }

  let c1 = provider.resolve(&CONFIG)?;
  let c2 = provider.create_scope()?.resolve(&CONFIG)?;
  assert!(
    Arc::ptr_eq(&c1, &c2),
    "Config should be the same instance everywhere"
  );
  println!("Config instances are the same pointer, as expected.");

  provider.dispose();
  Ok(())
}
