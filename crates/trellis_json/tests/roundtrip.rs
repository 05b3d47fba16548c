//! Leaf round-trips at boundary values.

use trellis_json::Engine;
use trellis_reflect::info::Typed;
use trellis_reflect::registry::TypeRegistryArc;
use trellis_reflect::Reflect;

fn engine() -> Engine {
    Engine::new(TypeRegistryArc::default())
}

fn roundtrip<T>(engine: &Engine, value: T)
where
    T: Reflect + Typed + PartialEq + core::fmt::Debug,
{
    let text = engine.serialize(&value).unwrap();
    let back: T = engine.deserialize(&text).unwrap();
    assert_eq!(back, value, "round-trip through {text}");
}

#[test]
fn signed_integer_boundaries() {
    let engine = engine();
    roundtrip(&engine, i8::MIN);
    roundtrip(&engine, i8::MAX);
    roundtrip(&engine, i16::MIN);
    roundtrip(&engine, i16::MAX);
    roundtrip(&engine, i32::MIN);
    roundtrip(&engine, i32::MAX);
    roundtrip(&engine, i64::MIN);
    roundtrip(&engine, i64::MAX);
    roundtrip(&engine, 0i32);
    roundtrip(&engine, -1i64);
}

#[test]
fn unsigned_integer_boundaries() {
    let engine = engine();
    roundtrip(&engine, u8::MAX);
    roundtrip(&engine, u16::MAX);
    roundtrip(&engine, u32::MAX);
    roundtrip(&engine, u64::MAX);
    roundtrip(&engine, 0u64);
    roundtrip(&engine, usize::MAX);
}

#[test]
fn int128_boundaries() {
    let engine = engine();
    roundtrip(&engine, i128::MIN);
    roundtrip(&engine, i128::MAX);
    roundtrip(&engine, u128::MAX);
}

#[test]
fn floats() {
    let engine = engine();
    roundtrip(&engine, 0.0f64);
    roundtrip(&engine, 1.5f64);
    roundtrip(&engine, -2.25f32);
    roundtrip(&engine, f64::MAX);
    roundtrip(&engine, f64::MIN_POSITIVE);
}

#[test]
fn text_scalars() {
    let engine = engine();
    roundtrip(&engine, true);
    roundtrip(&engine, false);
    roundtrip(&engine, 'é');
    roundtrip(&engine, String::from("plain"));
    roundtrip(&engine, String::from("escapes \"and\"\nnewlines\t\u{1F600}"));
    roundtrip(&engine, String::new());
}

#[test]
fn external_scalars() {
    let engine = engine();
    roundtrip(&engine, jiff::Timestamp::UNIX_EPOCH);
    roundtrip(
        &engine,
        "2024-06-19T15:22:45Z".parse::<jiff::Timestamp>().unwrap(),
    );
    roundtrip(&engine, jiff::SignedDuration::from_secs(3900));
    roundtrip(
        &engine,
        "6d2fa32f-b8f6-4a44-96cc-2f1b52e4f349".parse::<uuid::Uuid>().unwrap(),
    );
    roundtrip(&engine, "12.34".parse::<rust_decimal::Decimal>().unwrap());
    roundtrip(&engine, "-0.001".parse::<rust_decimal::Decimal>().unwrap());
}

#[test]
fn numeric_width_is_enforced() {
    let engine = engine();
    // One past i32::MAX: fails at 32 bits, parses at 64.
    let text = (i64::from(i32::MAX) + 1).to_string();
    assert!(matches!(
        engine.deserialize::<i32>(&text),
        Err(trellis_json::DeserializeError::Leaf { .. })
    ));
    assert_eq!(
        engine.deserialize::<i64>(&text).unwrap(),
        i64::from(i32::MAX) + 1
    );
}

#[test]
fn fractional_part_never_becomes_integer() {
    let engine = engine();
    assert!(engine.deserialize::<i32>("1.5").is_err());
    assert_eq!(engine.deserialize::<i32>("2.0").unwrap(), 2);
}

#[test]
fn sink_and_source_overloads() {
    let engine = engine();
    let mut buffer = Vec::new();
    engine.serialize_to(&42u32, &mut buffer).unwrap();
    assert_eq!(buffer, b"42");
    let back: u32 = engine.deserialize_from(buffer.as_slice()).unwrap();
    assert_eq!(back, 42);
}

#[test]
fn trailing_content_fails() {
    let engine = engine();
    assert!(matches!(
        engine.deserialize::<u32>("1 2"),
        Err(trellis_json::DeserializeError::Trailing { .. })
    ));
}
