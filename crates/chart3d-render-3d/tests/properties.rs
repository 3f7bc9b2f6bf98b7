//! Property tests for light normalization and edge-radius budgets.

use chart3d_render_3d::{effective_edge_radius, normalize_lights, pie_edge_radii, LightSource, Vector3};
use proptest::prelude::*;

fn light() -> impl Strategy<Value = LightSource> {
    prop_oneof![
        (0.01f64..10.0).prop_map(LightSource::ambient),
        ((-1.0f64..1.0, -1.0f64..1.0, -1.0f64..1.0), 0.01f64..10.0)
            .prop_map(|((x, y, z), i)| LightSource::directional(Vector3::new(x, y, z), i)),
    ]
}

proptest! {
    #[test]
    fn test_light_shares_sum_to_one(lights in prop::collection::vec(light(), 1..6)) {
        let lighting = normalize_lights(&lights);
        prop_assert!((lighting.total_share() - 1.0).abs() < 1e-9);
        prop_assert!((0.0..=1.0).contains(&lighting.ambient));
    }

    #[test]
    fn test_directional_resultant_fills_remaining_budget(lights in prop::collection::vec(light(), 1..6)) {
        let lighting = normalize_lights(&lights);
        let shares: Vector3 = lighting.lights.iter().map(|l| l.direction * l.share).sum();
        prop_assume!(shares.length() > 1e-6);

        let resultant: Vector3 = lighting.lights.iter().map(|l| l.direction * l.intensity).sum();
        prop_assert!((resultant.length() - (1.0 - lighting.ambient)).abs() < 1e-9);
    }

    #[test]
    fn test_edge_radius_is_bounded(
        height in -50.0f64..50.0,
        extent in 0.0f64..20.0,
        requested in -5.0f64..30.0,
    ) {
        let e = effective_edge_radius(height, extent, requested);
        prop_assert!(e >= 0.0);
        prop_assert!(e <= height.abs() / 3.0 + 1e-12);
        prop_assert!(e <= extent + 1e-12);
        prop_assert!(e <= requested.max(0.0));
    }

    #[test]
    fn test_pie_radii_share_the_span(
        span in 0.0f64..10.0,
        inner in 0.0f64..10.0,
        outer in 0.0f64..10.0,
    ) {
        let (i, o) = pie_edge_radii(span, inner, outer);
        prop_assert!(i >= 0.0 && o >= 0.0);
        prop_assert!(i <= inner && o <= outer);
        if inner + outer > span {
            prop_assert!((i + o - span).abs() < 1e-9);
        } else {
            prop_assert_eq!((i, o), (inner, outer));
        }
    }
}
