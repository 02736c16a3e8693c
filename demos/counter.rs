//! Counter whose state lives in the query string

use query_state::{FieldSchema, FieldValue, MemoryStore, Schema, TypedQueryState};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Query String Counter ===\n");

    let schema = Schema::builder()
        .field("count", FieldSchema::number().required().default_value(1))
        .field("labels", FieldSchema::string().array())
        .build()?;

    let location = MemoryStore::new();
    location.subscribe(|params| println!("   [URL] ?{params}"));

    println!("1. Mounting on an empty location");
    let query = TypedQueryState::new(schema, location.clone());

    let _render = query.watch(|state| {
        let count = state.get("count").and_then(FieldValue::as_number).unwrap_or_default();
        println!("   [Render] count is {count}");
    });

    println!("\n2. Clicking increment three times");
    for _ in 0..3 {
        let count = query
            .get("count")
            .and_then(|value| value.as_number())
            .unwrap_or_default();
        query.update("count", count + 1.0)?;
    }

    println!("\n3. Tagging the counter");
    query.update("labels", vec!["demo", "shared link"])?;

    println!("\n4. Going back in history");
    location.back();
    location.back();

    println!("\n5. Resetting to defaults");
    query.reset_to_defaults();

    println!("\nFinal query string: ?{}", location.query_string());
    Ok(())
}
