use mockweave_generate::{GenerateOptions, GenerationEngine};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let document = json!({
        "type": "array",
        "length": 3,
        "items": {
            "type": "object",
            "properties": {
                "id": {"type": "string", "generator": {"type": "uuid"}, "unique": true},
                "first": {"type": "string", "generator": {"type": "firstName"}},
                "last": {"type": "string", "generator": {"type": "lastName"}},
                "email": {
                    "type": "string",
                    "generator": {"type": "email", "firstName": "ref:./first", "lastName": "ref:./last"}
                },
                "joined": {"type": "date", "min": "2020-01-01"}
            }
        }
    });

    let engine = GenerationEngine::new(GenerateOptions {
        seed: Some(42),
        ..GenerateOptions::default()
    });
    let value = engine.generate(&document, Vec::new()).await?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
