use octothorpe::{AnyValue, Key, OctoError, Octothorpe};
use serde_json::json;
use tracing_subscriber::EnvFilter;

/// Demonstrates passing an Octothorpe between components as a message
fn main() -> Result<(), OctoError> {
    // RUST_LOG=octothorpe=trace shows what the library does
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // A request arrives as JSON from somewhere else
    let request = Octothorpe::try_new(json!({
        "user": "alice",
        "action": "rename",
        "new name": "Alice Liddell",
    }))?;

    let reply = Handler::new().handle(&request)?;
    print_reply(&reply);

    // Anything that isn't a hash is turned away at the door
    match Octothorpe::try_new(json!("rename alice")) {
        Ok(_) => println!("unexpected: a string was accepted"),
        Err(e) => println!("Rejected request: {}", e),
    }

    Ok(())
}

struct Handler {
    defaults: Octothorpe,
}

impl Handler {
    fn new() -> Self {
        Self {
            defaults: [("dry run", AnyValue::new(json!(false)))]
                .into_iter()
                .collect(),
        }
    }

    /// Builds a reply from the request without changing it
    fn handle(&self, request: &Octothorpe) -> Result<Octothorpe, OctoError> {
        // Fill in anything the sender left out; the request wins on conflicts
        let request = self.defaults.merge(request)?;

        let user = request.members().read("user");
        let new_name = request.get("new name");
        println!("Handling {:?} for {:?}", request["action"], user);

        // Only pass on what the next component needs
        let mut reply = request.whitelist(["user", "dry run"]);
        reply.guard_with([Key::from("status")], |_| json!("renamed"))?;
        if let Some(name) = new_name {
            reply = reply.merge([("name", name.clone())])?;
        }
        reply.freeze();
        Ok(reply)
    }
}

fn print_reply(reply: &Octothorpe) {
    println!("Reply ({} entries, frozen: {}):", reply.len(), reply.is_frozen());
    for (key, value) in reply {
        println!("  {} => {:?}", key, value);
    }
}
