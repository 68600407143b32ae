use flocksim::geometry::normalize_heading;
use flocksim::prelude::*;
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::f64::consts::TAU;

fn agent(bounds: Bounds, params: AgentParams) -> Agent {
    let mut rng = StdRng::seed_from_u64(99);
    Agent::new(&params, bounds, &mut rng)
}

fn neighbour() -> impl Strategy<Value = Neighbour> {
    prop_oneof![
        1 => Just(Neighbour::Myself),
        4 => (-50.0..550.0f64, -50.0..550.0f64, 0.0..TAU)
            .prop_map(|(x, y, heading)| Neighbour::Other { x, y, heading }),
    ]
}

fn behaviours() -> impl Strategy<Value = Behaviours> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(cohesion, separation, avoid_walls, alignment)| Behaviours {
            cohesion,
            separation,
            avoid_walls,
            alignment,
        },
    )
}

proptest! {
    #[test]
    fn normalized_heading_is_in_range_and_stable(h in -1e6..1e6f64) {
        let once = normalize_heading(h);
        prop_assert!((0.0..TAU).contains(&once));
        prop_assert_eq!(normalize_heading(once), once);
    }

    #[test]
    fn zero_strength_seek_never_turns(heading in 0.0..TAU, target in -10.0..10.0f64, rate in 0.0..5.0f64) {
        let a = agent(
            Bounds::new(100.0, 100.0),
            AgentParams::default().with_heading(heading).with_max_turn_rate(rate),
        );
        prop_assert_eq!(a.seek(target, 0.0), 0.0);
    }

    #[test]
    fn update_keeps_heading_in_range(
        x in 0.0..500.0f64,
        y in 0.0..500.0f64,
        heading in 0.0..TAU,
        speed in 0.0..40.0f64,
        rate in 0.0..10.0f64,
        radius in 0.0..300.0f64,
        separation in 0.0..300.0f64,
        weighted in any::<bool>(),
        neighbours in prop::collection::vec(neighbour(), 0..12),
        enabled in behaviours(),
    ) {
        let mut a = agent(
            Bounds::new(500.0, 500.0),
            AgentParams::default()
                .at(x, y)
                .with_heading(heading)
                .with_speed(speed)
                .with_max_turn_rate(rate)
                .with_neighbour_radius(radius)
                .with_optimal_separation(separation)
                .with_misalignment_weighting(weighted),
        );
        a.update_velocity(&neighbours, enabled);
        prop_assert!((0.0..TAU).contains(&a.heading()));
    }

    #[test]
    fn walls_stay_quiet_at_or_beyond_the_radius(
        x in 0.0..1000.0f64,
        y in 0.0..1000.0f64,
        radius in 1.0..400.0f64,
        heading in 0.0..TAU,
    ) {
        let bounds = Bounds::new(1000.0, 1000.0);
        let a = agent(
            bounds,
            AgentParams::default().at(x, y).with_heading(heading).with_neighbour_radius(radius),
        );
        if bounds.distance_to_edge(x, y) >= radius {
            prop_assert_eq!(a.avoid_walls(), 0.0);
        }
    }

    #[test]
    fn containment_lands_on_the_plane(
        x in -2000.0..2000.0f64,
        y in -2000.0..2000.0f64,
        width in 1.0..1500.0f64,
        height in 1.0..1500.0f64,
    ) {
        let bounds = Bounds::new(width, height);
        let mut a = agent(bounds, AgentParams::default().at(x, y));
        let heading = a.heading();
        let was_inside = bounds.contains(x, y);

        let moved = bounds.contain(&mut a);
        prop_assert!(bounds.contains(a.x(), a.y()));
        prop_assert_eq!(a.heading(), heading);
        prop_assert_eq!(moved, !was_inside);

        // coordinates that were in range are untouched, the rest sit on an edge
        if (0.0..=width).contains(&x) {
            prop_assert_eq!(a.x(), x);
        } else {
            prop_assert!(a.x() == 0.0 || a.x() == width);
        }
        if (0.0..=height).contains(&y) {
            prop_assert_eq!(a.y(), y);
        } else {
            prop_assert!(a.y() == 0.0 || a.y() == height);
        }
    }

    #[test]
    fn empty_neighbourhood_is_neutral(x in 0.0..500.0f64, y in 0.0..500.0f64, heading in 0.0..TAU) {
        let a = agent(Bounds::new(500.0, 500.0), AgentParams::default().at(x, y).with_heading(heading));
        prop_assert_eq!(a.seek_centre_neighbours(&[]), 0.0);
        prop_assert_eq!(a.avoid_neighbours(&[]), 0.0);
        prop_assert_eq!(a.align_with_neighbours(&[]), 0.0);
    }
}
