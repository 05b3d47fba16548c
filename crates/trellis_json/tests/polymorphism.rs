//! Dynamic slots and the `$type` discriminator.

use trellis_json::{DeserializeError, Engine, EngineConfig, TypeMetadataMode};
use trellis_reflect::registry::TypeRegistryArc;
use trellis_reflect::{DynValue, derive::Reflect};

#[derive(Reflect, Debug, PartialEq)]
#[reflect(type_path = "shapes::Circle")]
struct Circle {
    radius: f64,
}

#[derive(Reflect, Debug, PartialEq)]
#[reflect(type_path = "shapes::Square")]
struct Square {
    side: f64,
}

#[derive(Reflect)]
#[reflect(type_path = "shapes::Holder")]
struct Holder {
    shape: DynValue,
}

fn registry() -> TypeRegistryArc {
    let registry = TypeRegistryArc::default();
    {
        let mut registry = registry.write();
        registry.register::<Holder>();
        registry.register::<Circle>();
        registry.register::<Square>();
    }
    registry
}

#[test]
fn concrete_type_travels_in_the_discriminator() {
    let engine = Engine::new(registry());
    let holder = Holder {
        shape: DynValue::new(Circle { radius: 1.5 }),
    };

    let text = engine.serialize(&holder).unwrap();
    assert_eq!(text, r#"{"shape":{"$type":"shapes::Circle","radius":1.5}}"#);

    let back: Holder = engine.deserialize(&text).unwrap();
    assert_eq!(
        back.shape.downcast_ref::<Circle>(),
        Some(&Circle { radius: 1.5 })
    );
}

#[test]
fn each_payload_keeps_its_own_type() {
    let engine = Engine::new(registry());
    let holders = vec![
        Holder {
            shape: DynValue::new(Circle { radius: 1.0 }),
        },
        Holder {
            shape: DynValue::new(Square { side: 2.0 }),
        },
    ];

    let text = engine.serialize(&holders).unwrap();
    let back: Vec<Holder> = engine.deserialize(&text).unwrap();

    assert!(back[0].shape.downcast_ref::<Circle>().is_some());
    assert!(back[1].shape.downcast_ref::<Square>().is_some());
}

#[test]
fn missing_discriminator_fails_a_dynamic_slot() {
    let engine = Engine::new(registry());
    assert!(matches!(
        engine.deserialize::<Holder>(r#"{"shape":{"radius":1.0}}"#),
        Err(DeserializeError::MissingDiscriminator)
    ));
}

#[test]
fn unknown_type_name_fails() {
    let engine = Engine::new(registry());
    let text = r#"{"shape":{"$type":"shapes::Pentagon","sides":5}}"#;
    assert!(matches!(
        engine.deserialize::<Holder>(text),
        Err(DeserializeError::UnknownTypeName { .. })
    ));
}

#[test]
fn discriminator_on_a_mismatched_plain_slot_fails() {
    let engine = Engine::new(registry());
    // A `Square` document against a `Circle`-typed slot.
    let text = r#"{"$type":"shapes::Square","side":2.0}"#;
    assert!(matches!(
        engine.deserialize::<Circle>(text),
        Err(DeserializeError::TypeMismatch { .. })
    ));
}

#[test]
fn aliases_shorten_the_wire_names() {
    let config = EngineConfig::new().alias("Circle", "shapes::Circle");
    let engine = Engine::with_config(registry(), config);
    let holder = Holder {
        shape: DynValue::new(Circle { radius: 2.5 }),
    };

    let text = engine.serialize(&holder).unwrap();
    assert_eq!(text, r#"{"shape":{"$type":"Circle","radius":2.5}}"#);

    let back: Holder = engine.deserialize(&text).unwrap();
    assert!(back.shape.downcast_ref::<Circle>().is_some());
}

#[test]
fn short_names_resolve_when_unambiguous() {
    let engine = Engine::new(registry());
    // The registry indexes `Circle` by short name too.
    let text = r#"{"shape":{"$type":"Circle","radius":3.0}}"#;
    let back: Holder = engine.deserialize(text).unwrap();
    assert_eq!(
        back.shape.downcast_ref::<Circle>(),
        Some(&Circle { radius: 3.0 })
    );
}

#[test]
fn all_mode_stamps_plain_structs() {
    let engine = Engine::with_config(
        registry(),
        EngineConfig::new().type_metadata(TypeMetadataMode::All),
    );
    let text = engine.serialize(&Circle { radius: 1.5 }).unwrap();
    assert_eq!(text, r#"{"$type":"shapes::Circle","radius":1.5}"#);

    let back: Circle = engine.deserialize(&text).unwrap();
    assert_eq!(back, Circle { radius: 1.5 });
}

#[test]
fn read_type_metadata_off_uses_the_requested_type() {
    let engine = Engine::with_config(registry(), EngineConfig::new().read_type_metadata(false));
    // The discriminator is consumed but ignored.
    let text = r#"{"$type":"shapes::Square","radius":4.0}"#;
    let back: Circle = engine.deserialize(text).unwrap();
    assert_eq!(back, Circle { radius: 4.0 });
}

#[test]
fn generic_argument_keys_are_accepted_on_read() {
    #[derive(Reflect, Debug, PartialEq)]
    #[reflect(type_path = "shapes::Wrap")]
    struct Wrap<T> {
        item: T,
    }

    #[derive(Reflect)]
    #[reflect(type_path = "shapes::GenericHolder")]
    struct GenericHolder {
        value: DynValue,
    }

    let registry = TypeRegistryArc::default();
    {
        let mut registry = registry.write();
        registry.register::<GenericHolder>();
        registry.register::<Wrap<u64>>();
    }
    let engine = Engine::new(registry);

    // Writes fold generics into the path; reads also accept the split
    // `$generics` form.
    let text = r#"{"value":{"$type":"shapes::Wrap","$generics":["u64"],"item":7}}"#;
    let back: GenericHolder = engine.deserialize(text).unwrap();
    assert_eq!(
        back.value.downcast_ref::<Wrap<u64>>(),
        Some(&Wrap { item: 7u64 })
    );

    let folded = engine.serialize(&back).unwrap();
    assert_eq!(
        folded,
        r#"{"value":{"$type":"shapes::Wrap<u64>","item":7}}"#
    );
}
