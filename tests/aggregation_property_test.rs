// ==========================================
// 汇总顺序无关性（属性测试）
// ==========================================


use proptest::prelude::*;
use test_helpers::{fixture_rules, ComponentBuilder};
use ubp_calculator::domain::{Component, GeometryType};
use ubp_calculator::engine::{aggregate, compute, resolve};

// -- Strategy helpers --

fn arb_geometry() -> impl Strategy<Value = GeometryType> {
    prop_oneof![
        Just(GeometryType::Profile),
        Just(GeometryType::Sheet),
        Just(GeometryType::Plate),
        Just(GeometryType::Other),
    ]
}

fn arb_material() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("S235JR"),
        Just("st37-2"),
        Just("EN AW-6060"),
        Just("UNKNOWN123"),
        Just(""),
    ]
}

fn arb_coating() -> impl Strategy<Value = Option<&'static str>> {
    prop_oneof![
        Just(None),
        Just(Some("Pulverbeschichtung")),
        Just(Some("feuerverzinkt")),
        Just(Some("eloxiert")),
    ]
}

fn arb_component() -> impl Strategy<Value = Component> {
    (
        arb_material(),
        arb_geometry(),
        arb_coating(),
        proptest::option::of(0.0f64..5_000.0),
        proptest::option::of(0.0f64..200.0),
        1u32..20,
    )
        .prop_map(|(material, geometry, coating, mass, area, quantity)| {
            let mut builder = ComponentBuilder::new(material)
                .geometry(geometry)
                .quantity(quantity)
                .type_label("Schraube");
            if let Some(c) = coating {
                builder = builder.coating(c);
            }
            if let Some(m) = mass {
                builder = builder.mass(m);
            }
            if let Some(a) = area {
                builder = builder.area(a);
            }
            builder.build()
        })
}

fn arb_components_with_permutation() -> impl Strategy<Value = (Vec<Component>, Vec<Component>)> {
    prop::collection::vec(arb_component(), 0..40).prop_flat_map(|components| {
        let shuffled = Just(components.clone()).prop_shuffle();
        (Just(components), shuffled)
    })
}

proptest! {
    #[test]
    fn aggregate_is_order_independent((original, shuffled) in arb_components_with_permutation()) {
        let rules = fixture_rules();
        let records = |components: &[Component]| {
            components
                .iter()
                .map(|c| compute(c, &resolve(c, &rules)))
                .collect::<Vec<_>>()
        };

        let a = aggregate(&records(&original));
        let b = aggregate(&records(&shuffled));

        prop_assert_eq!(a.total_impact.to_bits(), b.total_impact.to_bits());
        prop_assert_eq!(a, b);
    }

    #[test]
    fn total_equals_material_plus_coating_per_record(component in arb_component()) {
        let rules = fixture_rules();
        let record = compute(&component, &resolve(&component, &rules));
        prop_assert_eq!(record.total_impact, record.material_impact + record.coating_impact);
        prop_assert!(record.total_impact >= 0.0);
    }
}
