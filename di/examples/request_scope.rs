use fibre_di::{service_key, Error, ServiceCollection, ServiceProvider};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// A per-request unit of work that reports when it is released.
struct Transaction {
  id: usize,
}

impl Drop for Transaction {
  fn drop(&mut self) {
    println!("  transaction {} released", self.id);
  }
}

struct RequestUser(String);

struct OrderHandler {
  tx: Arc<Transaction>,
  user: Arc<RequestUser>,
}

impl OrderHandler {
  fn place(&self, item: &str) -> String {
    format!("{} ordered {} in transaction {}", self.user.0, item, self.tx.id)
  }
}

service_key! {
  static TRANSACTION: Transaction;
  static USER: RequestUser;
  static HANDLER: OrderHandler;
}

static NEXT_TX: AtomicUsize = AtomicUsize::new(1);

fn handle(provider: &ServiceProvider, user: &str, item: &str) -> Result<String, Error> {
  provider.with_scope(|scope| {
    scope.set_instance(&USER, RequestUser(user.to_string()))?;
    let handler = scope.resolve(&HANDLER)?;
    Ok(handler.place(item))
  })
}

fn main() {
  let mut services = ServiceCollection::new();
  services
    .add_scoped(&TRANSACTION, |_| {
      Ok(Transaction {
        id: NEXT_TX.fetch_add(1, Ordering::SeqCst),
      })
    })
    .add_transient(&HANDLER, |r| {
      Ok(OrderHandler {
        tx: r.resolve(&TRANSACTION)?,
        user: r.resolve(&USER)?,
      })
    });
  let provider = services.build();

  for (user, item) in [("alice", "book"), ("bob", "lamp")] {
    println!("Handling request for {}...", user);
    match handle(&provider, user, item) {
      Ok(message) => println!("  {}", message),
      Err(err) => println!("  failed: {}", err),
    }
  }

  // Resolving a scoped service from the root is refused.
  match provider.resolve(&HANDLER) {
    Ok(_) => panic!("handler should need a scope"),
    Err(err) => println!("Root resolution refused: {}", err),
  }

  provider.dispose();
  match provider.create_scope() {
    Ok(_) => panic!("provider should be disposed"),
    Err(err) => println!("After dispose: {}", err),
  }
}
