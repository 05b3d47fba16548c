//! The canonical metadata example: one object, full metadata section.

use trellis_json::{Engine, EngineConfig, TypeMetadataMode};
use trellis_reflect::derive::Reflect;
use trellis_reflect::registry::TypeRegistryArc;

#[derive(Reflect, Debug, PartialEq)]
#[reflect(type_path = "demo::Person")]
struct Person {
    name: String,
    age: u32,
}

#[test]
fn metadata_carries_id_then_discriminator_then_members() {
    let registry = TypeRegistryArc::default();
    registry.write().register::<Person>();
    let engine = Engine::with_config(
        registry,
        EngineConfig::new()
            .preserve_references(true)
            .type_metadata(TypeMetadataMode::All),
    );

    let person = Person {
        name: "Ada".into(),
        age: 2,
    };

    let text = engine.serialize(&person).unwrap();
    assert_eq!(
        text,
        r#"{"$id":"1","$type":"demo::Person","name":"Ada","age":2}"#
    );

    let back: Person = engine.deserialize(&text).unwrap();
    assert_eq!(back, person);
}

#[test]
fn engine_calls_are_independent() {
    let registry = TypeRegistryArc::default();
    registry.write().register::<Person>();
    let engine = Engine::with_config(
        registry,
        EngineConfig::new().preserve_references(true),
    );

    // Ids restart per call; per-call state never leaks across calls.
    let first = engine
        .serialize(&Person {
            name: "A".into(),
            age: 1,
        })
        .unwrap();
    let second = engine
        .serialize(&Person {
            name: "A".into(),
            age: 1,
        })
        .unwrap();
    assert_eq!(first, second);
    assert!(first.contains(r#""$id":"1""#));
}

#[test]
fn shared_engine_runs_from_multiple_threads() {
    use std::sync::Arc;

    let registry = TypeRegistryArc::default();
    registry.write().register::<Person>();
    let engine = Arc::new(Engine::new(registry));

    let handles: Vec<_> = (0..4)
        .map(|age| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                let text = engine
                    .serialize(&Person {
                        name: "T".into(),
                        age,
                    })
                    .unwrap();
                let back: Person = engine.deserialize(&text).unwrap();
                assert_eq!(back.age, age);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
