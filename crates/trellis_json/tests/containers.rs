//! Containers, dictionaries, pretty output, and serialization rules.

use std::collections::{BTreeMap, HashMap};

use trellis_json::{Engine, EngineConfig, Rule};
use trellis_reflect::derive::Reflect;
use trellis_reflect::registry::TypeRegistryArc;

fn engine() -> Engine {
    Engine::new(TypeRegistryArc::default())
}

#[test]
fn empty_containers_decode_to_empty_not_null() {
    let engine = engine();

    let list: Vec<u32> = engine.deserialize("[]").unwrap();
    assert!(list.is_empty());
    assert_eq!(engine.serialize(&list).unwrap(), "[]");

    let map: HashMap<String, u32> = engine.deserialize("{}").unwrap();
    assert!(map.is_empty());
    assert_eq!(engine.serialize(&map).unwrap(), "{}");
}

#[test]
fn nested_containers_round_trip() {
    let engine = engine();
    let nested: Vec<Vec<Option<u32>>> = vec![vec![Some(1), None], vec![], vec![Some(3)]];

    let text = engine.serialize(&nested).unwrap();
    assert_eq!(text, "[[1,null],[],[3]]");
    let back: Vec<Vec<Option<u32>>> = engine.deserialize(&text).unwrap();
    assert_eq!(back, nested);
}

#[test]
fn string_keyed_maps_round_trip() {
    let engine = engine();
    let mut map = HashMap::new();
    map.insert("alpha".to_string(), 1u32);
    map.insert("beta".to_string(), 2u32);

    let text = engine.serialize(&map).unwrap();
    let back: HashMap<String, u32> = engine.deserialize(&text).unwrap();
    assert_eq!(back, map);
}

#[test]
fn integer_keys_go_through_the_key_codec() {
    let engine = engine();
    let mut map = BTreeMap::new();
    map.insert(1u32, "one".to_string());
    map.insert(2u32, "two".to_string());

    let text = engine.serialize(&map).unwrap();
    // BTreeMap iterates in key order, so the text is deterministic.
    assert_eq!(text, r#"{"1":"one","2":"two"}"#);

    let back: BTreeMap<u32, String> = engine.deserialize(&text).unwrap();
    assert_eq!(back, map);
}

#[test]
fn uuid_keys_round_trip() {
    let engine = engine();
    let key: uuid::Uuid = "6d2fa32f-b8f6-4a44-96cc-2f1b52e4f349".parse().unwrap();
    let mut map = HashMap::new();
    map.insert(key, 7u32);

    let text = engine.serialize(&map).unwrap();
    assert_eq!(text, r#"{"6d2fa32f-b8f6-4a44-96cc-2f1b52e4f349":7}"#);
    let back: HashMap<uuid::Uuid, u32> = engine.deserialize(&text).unwrap();
    assert_eq!(back, map);
}

#[test]
fn map_keys_are_not_normalized() {
    let engine = engine();
    let mut map = HashMap::new();
    map.insert("User_Name".to_string(), 1u32);

    let text = engine.serialize(&map).unwrap();
    // Data-bearing keys keep their exact form.
    assert_eq!(text, r#"{"User_Name":1}"#);
    let back: HashMap<String, u32> = engine.deserialize(&text).unwrap();
    assert_eq!(back, map);
}

// -----------------------------------------------------------------------------
// Pretty output

#[derive(Reflect, Debug, PartialEq)]
struct Report {
    title: String,
    figures: Vec<u32>,
}

#[test]
fn pretty_and_compact_are_semantically_identical() {
    let report = Report {
        title: "Q3".into(),
        figures: vec![1, 2, 3],
    };

    let compact = engine().serialize(&report).unwrap();
    let pretty = Engine::with_config(TypeRegistryArc::default(), EngineConfig::new().pretty(true))
        .serialize(&report)
        .unwrap();

    assert_ne!(compact, pretty);
    assert!(pretty.contains('\n'));
    let compact_value: serde_json::Value = serde_json::from_str(&compact).unwrap();
    let pretty_value: serde_json::Value = serde_json::from_str(&pretty).unwrap();
    assert_eq!(compact_value, pretty_value);

    // Both decode to the same graph.
    let engine = engine();
    assert_eq!(engine.deserialize::<Report>(&compact).unwrap(), report);
    assert_eq!(engine.deserialize::<Report>(&pretty).unwrap(), report);
}

// -----------------------------------------------------------------------------
// Rules

#[derive(Reflect, Debug)]
struct Account {
    user: String,
    secret: String,
    balance: u32,
}

#[test]
fn deny_rules_drop_members() {
    let mut engine = engine();
    engine.add_rule::<Account>(Rule::deny(["secret"]));

    let account = Account {
        user: "ada".into(),
        secret: "hunter2".into(),
        balance: 10,
    };
    let text = engine.serialize(&account).unwrap();
    assert_eq!(text, r#"{"user":"ada","balance":10}"#);
}

#[test]
fn allow_rules_keep_only_listed_members() {
    let mut engine = engine();
    engine.add_rule::<Account>(Rule::allow(["user"]));

    let account = Account {
        user: "ada".into(),
        secret: "hunter2".into(),
        balance: 10,
    };
    assert_eq!(engine.serialize(&account).unwrap(), r#"{"user":"ada"}"#);
}

#[test]
fn container_factories_are_pluggable() {
    use trellis_reflect::registry::{TypeTraitFactory, TypeRegistryArc};

    let registry = TypeRegistryArc::default();
    {
        let mut registry = registry.write();
        registry.register::<Vec<u32>>();
        registry
            .get_mut(core::any::TypeId::of::<Vec<u32>>())
            .unwrap()
            .insert_trait(TypeTraitFactory::from_fn(|| Box::new(vec![99u32])));
    }
    let engine = Engine::new(registry);

    // The parser constructs its destination through the registered
    // factory, so the sentinel element survives.
    let list: Vec<u32> = engine.deserialize("[1,2]").unwrap();
    assert_eq!(list, vec![99, 1, 2]);
}
