//! Polymorphic-switch strategies: a registered strategy takes over when
//! the discriminator names a type other than the requested one.

use std::sync::Arc;

use trellis_json::de::{MetaSection, ParseCx, ParseOutcome, PolySwitch, Resolved};
use trellis_json::token::TokenKind;
use trellis_json::{DeserializeError, Engine};
use trellis_reflect::derive::Reflect;
use trellis_reflect::info::{TypeInfo, Typed};
use trellis_reflect::registry::TypeRegistryArc;

#[derive(Reflect, Debug, PartialEq)]
#[reflect(type_path = "shapes::Circle")]
struct Circle {
    radius: f64,
}

#[derive(Reflect, Debug, PartialEq)]
#[reflect(type_path = "shapes::LegacySquare")]
struct LegacySquare {
    side: f64,
}

/// Upgrades legacy square documents into circles of equal extent.
struct SquareUpgrade;

impl PolySwitch for SquareUpgrade {
    fn parse_body(
        &self,
        cx: &mut ParseCx<'_, '_>,
        _meta: &MetaSection,
        _concrete: &'static TypeInfo,
        closed: bool,
    ) -> Result<ParseOutcome, DeserializeError> {
        let mut side = 0.0f64;
        if !closed {
            loop {
                let token = cx.cursor().next()?;
                match token.kind {
                    TokenKind::EndObject => break,
                    TokenKind::Key => {
                        let key = token.text.into_owned();
                        cx.cursor().expect(TokenKind::PairDelim, "`:`")?;
                        let value = match cx.parse_next(f64::type_info())? {
                            ParseOutcome::Resolved(resolved) => resolved.value,
                            ParseOutcome::Deferred { awaited, .. } => {
                                return Err(DeserializeError::UndeferrableForward {
                                    id: awaited,
                                });
                            }
                        };
                        if key == "side" {
                            side = *value.downcast_ref::<f64>().expect("parsed as f64");
                        }
                        match cx.cursor().next()?.kind {
                            TokenKind::ValueDelim => {}
                            TokenKind::EndObject => break,
                            _ => panic!("malformed test document"),
                        }
                    }
                    _ => panic!("malformed test document"),
                }
            }
        }
        Ok(Resolved::plain(Box::new(Circle { radius: side / 2.0 })).into())
    }
}

#[test]
fn registered_switch_takes_over_mismatched_discriminators() {
    let registry = TypeRegistryArc::default();
    {
        let mut registry = registry.write();
        registry.register::<Circle>();
        registry.register::<LegacySquare>();
    }

    let mut engine = Engine::new(registry);
    engine.register_poly_switch::<LegacySquare>(Arc::new(SquareUpgrade));

    let text = r#"{"$type":"shapes::LegacySquare","side":3.0}"#;
    let circle: Circle = engine.deserialize(text).unwrap();
    assert_eq!(circle, Circle { radius: 1.5 });
}

#[test]
fn without_a_switch_the_mismatch_stays_an_error() {
    let registry = TypeRegistryArc::default();
    {
        let mut registry = registry.write();
        registry.register::<Circle>();
        registry.register::<LegacySquare>();
    }
    let engine = Engine::new(registry);

    let text = r#"{"$type":"shapes::LegacySquare","side":3.0}"#;
    assert!(matches!(
        engine.deserialize::<Circle>(text),
        Err(DeserializeError::TypeMismatch { .. })
    ));
}
