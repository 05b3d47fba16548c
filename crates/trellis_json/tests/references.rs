//! Reference preservation: aliasing, cycles, forward references, and the
//! recursion ceiling.

use trellis_json::{DeserializeError, Engine, EngineConfig, SerializeError};
use trellis_reflect::registry::TypeRegistryArc;
use trellis_reflect::{Shared, derive::Reflect};

#[derive(Reflect, Debug, Default, PartialEq)]
#[reflect(type_path = "graph::Node", default)]
struct Node {
    tag: String,
}

// Deferred members bypass constructor parameters, so graph owners keep a
// default-construction path open.
#[derive(Reflect, Default)]
#[reflect(type_path = "graph::Pair", default)]
struct Pair {
    left: Shared<Node>,
    right: Shared<Node>,
}

#[derive(Reflect, Default)]
#[reflect(type_path = "graph::ListNode", default)]
struct ListNode {
    label: String,
    next: Option<Shared<ListNode>>,
}

fn registry() -> TypeRegistryArc {
    let registry = TypeRegistryArc::default();
    {
        let mut registry = registry.write();
        registry.register::<Pair>();
        registry.register::<ListNode>();
    }
    registry
}

fn preserving_engine() -> Engine {
    Engine::with_config(registry(), EngineConfig::new().preserve_references(true))
}

#[test]
fn aliases_serialize_as_one_body_plus_reference() {
    let engine = preserving_engine();
    let node = Shared::new(Node { tag: "x".into() });
    let pair = Pair {
        left: node.clone(),
        right: node,
    };

    let text = engine.serialize(&pair).unwrap();
    assert_eq!(
        text,
        r#"{"$id":"1","left":{"$id":"2","tag":"x"},"right":{"$ref":"2"}}"#
    );

    let back: Pair = engine.deserialize(&text).unwrap();
    assert!(Shared::ptr_eq(&back.left, &back.right));
    assert_eq!(back.left.borrow().tag, "x");
}

#[test]
fn preservation_off_writes_independent_bodies() {
    let engine = Engine::new(registry());
    let node = Shared::new(Node { tag: "x".into() });
    let pair = Pair {
        left: node.clone(),
        right: node,
    };

    let text = engine.serialize(&pair).unwrap();
    assert_eq!(text, r#"{"left":{"tag":"x"},"right":{"tag":"x"}}"#);

    let back: Pair = engine.deserialize(&text).unwrap();
    assert!(!Shared::ptr_eq(&back.left, &back.right));
}

#[test]
fn forward_reference_resolves_within_the_call() {
    let engine = preserving_engine();
    // `left` references an id introduced only later by `right`.
    let text = r#"{"left":{"$ref":"9"},"right":{"$id":"9","tag":"fwd"}}"#;

    let back: Pair = engine.deserialize(text).unwrap();
    assert!(Shared::ptr_eq(&back.left, &back.right));
    assert_eq!(back.right.borrow().tag, "fwd");
}

#[test]
fn forward_reference_through_nested_plain_values() {
    #[derive(Reflect, Default)]
    #[reflect(type_path = "graph::Inner", default)]
    struct Inner {
        link: Option<Shared<Node>>,
    }

    #[derive(Reflect)]
    #[reflect(type_path = "graph::Outer")]
    struct Outer {
        wrapper: Inner,
        target: Option<Shared<Node>>,
    }

    let registry = registry();
    registry.write().register::<Outer>();
    let engine = Engine::with_config(registry, EngineConfig::new().preserve_references(true));

    let text = r#"{"wrapper":{"link":{"$ref":"7"}},"target":{"$id":"7","tag":"t"}}"#;
    let back: Outer = engine.deserialize(text).unwrap();

    let link = back.wrapper.link.as_ref().unwrap();
    let target = back.target.as_ref().unwrap();
    assert!(Shared::ptr_eq(link, target));
}

#[test]
fn unresolved_forward_reference_is_an_error() {
    let engine = preserving_engine();
    let text = r#"{"left":{"$ref":"9"},"right":{"$id":"1","tag":"x"}}"#;
    assert!(matches!(
        engine.deserialize::<Pair>(text),
        Err(DeserializeError::UnresolvedReference { id: 9 })
    ));
}

#[test]
fn cyclic_graph_round_trips() {
    let engine = preserving_engine();

    let a = Shared::new(ListNode {
        label: "a".into(),
        next: None,
    });
    let b = Shared::new(ListNode {
        label: "b".into(),
        next: Some(a.clone()),
    });
    a.borrow_mut().next = Some(b.clone());

    let text = engine.serialize(&a).unwrap();
    assert_eq!(
        text,
        r#"{"$id":"1","label":"a","next":{"$id":"2","label":"b","next":{"$ref":"1"}}}"#
    );

    let a2: Shared<ListNode> = engine.deserialize(&text).unwrap();
    let b2 = a2.borrow().next.clone().unwrap();
    let around = b2.borrow().next.clone().unwrap();
    assert!(Shared::ptr_eq(&a2, &around));
    assert_eq!(b2.borrow().label, "b");
}

#[test]
fn self_reference_round_trips() {
    let engine = preserving_engine();
    let node = Shared::new(ListNode {
        label: "loop".into(),
        next: None,
    });
    node.borrow_mut().next = Some(node.clone());

    let text = engine.serialize(&node).unwrap();
    assert_eq!(
        text,
        r#"{"$id":"1","label":"loop","next":{"$ref":"1"}}"#
    );

    let back: Shared<ListNode> = engine.deserialize(&text).unwrap();
    let next = back.borrow().next.clone().unwrap();
    assert!(Shared::ptr_eq(&back, &next));
}

#[test]
fn unguarded_cycle_hits_the_depth_ceiling() {
    let engine = Engine::new(registry());
    let node = Shared::new(ListNode {
        label: "loop".into(),
        next: None,
    });
    node.borrow_mut().next = Some(node.clone());

    assert!(matches!(
        engine.serialize(&node),
        Err(SerializeError::DepthExceeded { .. })
    ));
}

#[test]
fn shared_elements_in_collections() {
    let engine = preserving_engine();
    let node = Shared::new(Node { tag: "n".into() });
    let list: Vec<Shared<Node>> = vec![node.clone(), node];

    let text = engine.serialize(&list).unwrap();
    assert_eq!(text, r#"[{"$id":"1","tag":"n"},{"$ref":"1"}]"#);

    let back: Vec<Shared<Node>> = engine.deserialize(&text).unwrap();
    assert!(Shared::ptr_eq(&back[0], &back[1]));
}

#[test]
fn forward_reference_in_a_collection_is_undeferrable() {
    let engine = preserving_engine();
    let text = r#"[{"$ref":"1"},{"$id":"1","tag":"n"}]"#;
    assert!(matches!(
        engine.deserialize::<Vec<Shared<Node>>>(text),
        Err(DeserializeError::UndeferrableForward { id: 1 })
    ));
}

#[test]
fn shared_list_takes_the_values_envelope() {
    let engine = preserving_engine();
    let list = Shared::new(vec![1u32, 2, 3]);

    let text = engine.serialize(&list).unwrap();
    assert_eq!(text, r#"{"$id":"1","$values":[1,2,3]}"#);

    let back: Shared<Vec<u32>> = engine.deserialize(&text).unwrap();
    assert_eq!(*back.borrow(), vec![1, 2, 3]);
}

#[test]
fn shared_list_without_preservation_is_a_bare_array() {
    let engine = Engine::new(registry());
    let list = Shared::new(vec![1u32, 2]);
    let text = engine.serialize(&list).unwrap();
    assert_eq!(text, "[1,2]");

    let back: Shared<Vec<u32>> = engine.deserialize(&text).unwrap();
    assert_eq!(*back.borrow(), vec![1, 2]);
}
