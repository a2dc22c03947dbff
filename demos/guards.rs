use octothorpe::{MemberCall, OctoError, Octothorpe};
use std::collections::HashMap;

#[derive(Debug, Default, PartialEq)]
struct Settings {
    theme: String,
    page_size: u32,
}

/// Demonstrates guard conditions, freezing and member reads
fn main() -> Result<(), OctoError> {
    let mut incoming = HashMap::new();
    incoming.insert("one".to_string(), 1);
    incoming.insert("two".to_string(), 2);

    let mut ot = Octothorpe::try_new(incoming)?;

    // Each key that is not present gets a default; "one" is left alone
    ot.guard::<Vec<String>>(["one", "tags"])?
        .guard::<Settings>(["settings"])?
        .guard_with(["label"], |key| format!("<{}>", key))?;

    // Optional step - makes the Octothorpe truly read-only
    ot.freeze();

    let members = ot.members();
    println!("one: {:?}", members.read("one"));
    println!("tags: {:?}", members.read_as::<Vec<String>>("tags"));
    println!("settings: {:?}", members.read_as::<Settings>("settings"));
    println!("label: {:?}", members.read("label"));
    println!("three: {:?}", members.read("three"));

    // A member is a plain read
    if let Err(e) = members.send("two", MemberCall::new().arg(10)) {
        println!("Error: {}", e);
    }

    // And after freeze, guards are refused
    match ot.guard::<u32>(["count"]) {
        Ok(_) => println!("unexpected: guard after freeze"),
        Err(e) => println!("Error: {}", e),
    }

    let total = ot.inject(0, |sum, _, value| {
        sum + value.downcast_ref::<i32>().copied().unwrap_or(0)
    });
    println!("Sum of the integer members: {}", total);

    Ok(())
}
