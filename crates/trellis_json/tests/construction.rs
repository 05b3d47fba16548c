//! Constructor selection, leftover injection, and slot policies.

use trellis_json::{DeserializeError, Engine, EngineConfig, UnknownKeys};
use trellis_reflect::derive::Reflect;
use trellis_reflect::registry::TypeRegistryArc;

fn engine() -> Engine {
    Engine::new(TypeRegistryArc::default())
}

// -----------------------------------------------------------------------------
// Constructor selection

#[derive(Reflect, Debug, PartialEq)]
#[reflect(constructor = "new(name)")]
#[reflect(constructor = "with_age(name, age)")]
struct Person {
    name: String,
    #[reflect(readonly)]
    age: u32,
    via: String,
}

impl Person {
    fn new(name: String) -> Self {
        Self {
            name,
            age: 0,
            via: "new".into(),
        }
    }

    fn with_age(name: String, age: u32) -> Self {
        Self {
            name,
            age,
            via: "with_age".into(),
        }
    }
}

#[test]
fn richer_constructor_wins_when_satisfiable() {
    let engine = engine();
    let person: Person = engine
        .deserialize(r#"{"name":"Ada","age":36}"#)
        .unwrap();
    // Both constructors are satisfiable; the parameter superset wins.
    assert_eq!(person.via, "with_age");
    assert_eq!(person.age, 36);
}

#[test]
fn poorer_constructor_covers_partial_documents() {
    let engine = engine();
    let person: Person = engine.deserialize(r#"{"name":"Ada"}"#).unwrap();
    assert_eq!(person.via, "new");
    assert_eq!(person.age, 0);
}

#[test]
fn leftover_members_inject_after_construction() {
    let engine = engine();
    let person: Person = engine
        .deserialize(r#"{"name":"Ada","age":36,"via":"document"}"#)
        .unwrap();
    assert_eq!(person.via, "document");
    assert_eq!(person.age, 36);
}

#[test]
fn unsatisfiable_documents_fail() {
    let engine = engine();
    // Neither constructor is satisfiable without `name`, and `Person`
    // registers no default construction.
    assert!(matches!(
        engine.deserialize::<Person>(r#"{"age":1}"#),
        Err(DeserializeError::NoConstructor { .. })
    ));
}

// -----------------------------------------------------------------------------
// Tie-breaking

#[derive(Reflect, Debug)]
#[reflect(constructor = "first(x)")]
#[reflect(constructor = "second(y)")]
struct Tie {
    x: u32,
    y: u32,
    tag: String,
}

impl Tie {
    fn first(x: u32) -> Self {
        Self {
            x,
            y: 0,
            tag: "first".into(),
        }
    }

    fn second(y: u32) -> Self {
        Self {
            x: 0,
            y,
            tag: "second".into(),
        }
    }
}

#[test]
fn equal_counts_break_toward_declaration_order() {
    let engine = engine();
    let tie: Tie = engine.deserialize(r#"{"x":1,"y":2}"#).unwrap();
    assert_eq!(tie.tag, "first");
    assert_eq!(tie.x, 1);
    // `y` was not consumed by `first`, so it injects afterwards.
    assert_eq!(tie.y, 2);
}

// -----------------------------------------------------------------------------
// Read-only slots

#[derive(Reflect, Debug)]
#[reflect(constructor = "of(a)")]
struct Locked {
    a: u32,
    #[reflect(readonly)]
    b: u32,
}

impl Locked {
    fn of(a: u32) -> Self {
        Self { a, b: 0 }
    }
}

#[test]
fn readonly_leftover_fails() {
    let engine = engine();
    assert!(matches!(
        engine.deserialize::<Locked>(r#"{"a":1,"b":2}"#),
        Err(DeserializeError::ReadOnlyLeftover { slot: "b", .. })
    ));
}

// -----------------------------------------------------------------------------
// Default construction

#[derive(Reflect, Debug, Default, PartialEq)]
#[reflect(default)]
struct Settings {
    retries: u32,
    verbose: bool,
}

#[test]
fn empty_document_takes_the_default_constructor() {
    let engine = engine();
    let settings: Settings = engine.deserialize("{}").unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn partial_document_falls_back_to_default_plus_injection() {
    let engine = engine();
    let settings: Settings = engine.deserialize(r#"{"retries":3}"#).unwrap();
    assert_eq!(settings.retries, 3);
    assert!(!settings.verbose);
}

// -----------------------------------------------------------------------------
// Unknown keys

#[derive(Reflect, Debug)]
struct Versioned {
    kept: u32,
}

#[test]
fn unknown_keys_fail_fast_by_default() {
    let engine = engine();
    assert!(matches!(
        engine.deserialize::<Versioned>(r#"{"kept":1,"dropped":{"deep":[1,2]}}"#),
        Err(DeserializeError::UnknownKey { key, .. }) if key == "dropped"
    ));
}

#[test]
fn skip_mode_drops_unknown_values() {
    let engine = Engine::with_config(
        TypeRegistryArc::default(),
        EngineConfig::new().unknown_keys(UnknownKeys::Skip),
    );
    let versioned: Versioned = engine
        .deserialize(r#"{"dropped":{"deep":[1,{"two":2}]},"kept":1,"later":null}"#)
        .unwrap();
    assert_eq!(versioned.kept, 1);
}

// -----------------------------------------------------------------------------
// Renames and normalization

#[derive(Reflect, Debug, PartialEq)]
struct Address {
    #[reflect(rename = "zip")]
    zip_code: String,
    street_name: String,
}

#[test]
fn renamed_and_normalized_keys_round_trip() {
    let engine = engine();
    let address = Address {
        zip_code: "01187".into(),
        street_name: "Nöthnitzer Str.".into(),
    };

    let text = engine.serialize(&address).unwrap();
    // `zip` travels renamed; `street_name` loses its underscore to the
    // default normalizer.
    assert_eq!(
        text,
        r#"{"zip":"01187","streetname":"Nöthnitzer Str."}"#
    );

    let back: Address = engine.deserialize(&text).unwrap();
    assert_eq!(back, address);
}

// -----------------------------------------------------------------------------
// Enums

#[derive(Reflect, Debug, PartialEq)]
enum Color {
    Red,
    Green,
    Blue,
}

#[derive(Reflect, Debug, PartialEq)]
struct Paint {
    color: Color,
    amount: u32,
}

#[test]
fn enums_round_trip_by_variant_name() {
    let engine = engine();
    let paint = Paint {
        color: Color::Green,
        amount: 3,
    };

    let text = engine.serialize(&paint).unwrap();
    assert_eq!(text, r#"{"color":"Green","amount":3}"#);

    let back: Paint = engine.deserialize(&text).unwrap();
    assert_eq!(back, paint);
}

#[test]
fn unknown_variants_fail() {
    let engine = engine();
    assert!(matches!(
        engine.deserialize::<Paint>(r#"{"color":"Chartreuse","amount":1}"#),
        Err(DeserializeError::UnknownVariant { variant, .. }) if variant == "Chartreuse"
    ));
}

// -----------------------------------------------------------------------------
// Ignored fields

#[derive(Reflect, Debug)]
struct WithCache {
    value: u32,
    #[reflect(ignore)]
    cache: Vec<u8>,
}

#[test]
fn ignored_fields_are_invisible() {
    let engine = engine();
    let with_cache = WithCache {
        value: 5,
        cache: vec![1, 2, 3],
    };

    let text = engine.serialize(&with_cache).unwrap();
    assert_eq!(text, r#"{"value":5}"#);

    let back: WithCache = engine.deserialize(&text).unwrap();
    assert_eq!(back.value, 5);
    // Synthesized constructors fill ignored fields from `Default`.
    assert!(back.cache.is_empty());

    // And the ignored name is unknown on the wire.
    assert!(matches!(
        engine.deserialize::<WithCache>(r#"{"value":5,"cache":[]}"#),
        Err(DeserializeError::UnknownKey { .. })
    ));
}
