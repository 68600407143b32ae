use flocksim::agent::MIN_SENSING_DISTANCE;
use flocksim::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn build(bounds: Bounds, params: &[AgentParams], behaviours: Behaviours) -> Population {
    let mut rng = StdRng::seed_from_u64(5);
    let agents = params.iter().map(|p| Agent::new(p, bounds, &mut rng)).collect();
    Population::from_agents(bounds, agents, behaviours)
}

fn seeded(count: usize) -> PopulationConfig {
    PopulationConfig {
        width: 400.0,
        height: 300.0,
        count,
        seed: Some(1234),
        ..PopulationConfig::default()
    }
}

#[test]
fn lone_agent_flies_straight() {
    let params = AgentParams::default()
        .at(50.0, 50.0)
        .with_heading(0.3)
        .with_speed(5.0)
        .with_neighbour_radius(1.0);
    let behaviours = Behaviours { avoid_walls: false, ..Behaviours::default() };
    let mut population = build(Bounds::new(100.0, 100.0), &[params], behaviours);

    // round(5·cos 0.3) = 5, round(5·sin 0.3) = 1
    for k in 1..=6 {
        assert_eq!(population.tick(), 0);
        let agent = &population.agents()[0];
        assert_eq!(agent.position(), (50.0 + 5.0 * k as f64, 50.0 + k as f64));
        assert!((agent.heading() - 0.3).abs() < 1e-12);
        assert_eq!(agent.neighbours(), &[0]);
    }
}

#[test]
fn escaped_agent_is_put_back_on_the_edge() {
    let params = AgentParams::default().at(98.0, 50.0).with_heading(0.0).with_speed(5.0);
    let mut population = build(Bounds::new(100.0, 100.0), &[params], Behaviours::none());

    assert_eq!(population.tick(), 1);
    let agent = &population.agents()[0];
    assert_eq!(agent.position(), (100.0, 50.0));
    assert_eq!(agent.heading(), 0.0);
}

#[test]
fn later_agents_see_earlier_moves_in_the_same_tick() {
    let mover = AgentParams::default()
        .at(80.0, 100.0)
        .with_heading(0.0)
        .with_speed(12.0)
        .with_neighbour_radius(10.0);
    let sitter = AgentParams::default()
        .at(100.0, 100.0)
        .with_heading(0.0)
        .with_speed(0.0)
        .with_neighbour_radius(10.0);
    let mut population = build(Bounds::new(200.0, 200.0), &[mover, sitter], Behaviours::none());
    assert_eq!(population.agents()[1].neighbours(), &[1]);

    population.tick();

    // the mover only had itself in range, the sitter already sees it at x = 92
    assert_eq!(population.agents()[0].x(), 92.0);
    assert_eq!(population.agents()[0].neighbours(), &[0]);
    assert_eq!(population.agents()[1].neighbours(), &[0, 1]);
}

#[test]
fn shrinking_keeps_the_head_and_growing_appends() {
    let mut population = Population::new(&seeded(10));
    let head: Vec<_> = population.agents()[..3]
        .iter()
        .map(|a| (a.position(), a.heading()))
        .collect();

    population.set_count(3);
    assert_eq!(population.len(), 3);
    let kept: Vec<_> = population.agents().iter().map(|a| (a.position(), a.heading())).collect();
    assert_eq!(kept, head);

    population.set_count(10);
    assert_eq!(population.len(), 10);
    let kept: Vec<_> = population.agents()[..3]
        .iter()
        .map(|a| (a.position(), a.heading()))
        .collect();
    assert_eq!(kept, head);
    for agent in &population.agents()[3..] {
        assert!(population.bounds().contains(agent.x(), agent.y()));
        assert!(!agent.neighbours().is_empty(), "neighbour sets refreshed on growth");
    }
}

#[test]
fn resize_is_broadcast_but_clamping_waits_for_a_tick() {
    let params = AgentParams::default().at(150.0, 150.0).with_speed(0.0);
    let mut population = build(Bounds::new(200.0, 200.0), &[params], Behaviours::none());

    population.resize(100.0, 120.0);
    assert_eq!(population.agents()[0].bounds(), Bounds::new(100.0, 120.0));
    assert_eq!(population.agents()[0].position(), (150.0, 150.0));

    assert_eq!(population.tick(), 1);
    assert_eq!(population.agents()[0].position(), (100.0, 120.0));
}

#[test]
fn setters_reach_current_and_future_agents() {
    let mut population = Population::new(&seeded(4));
    population.set_speed(-3.0);
    population.set_turn_rate(0.2);
    population.set_neighbour_radius(0.0);
    population.set_separation(42.0);
    population.set_count(8);

    for agent in population.agents() {
        assert_eq!(agent.speed(), 3.0);
        assert_eq!(agent.max_turn_rate(), 0.2);
        assert_eq!(agent.neighbour_radius(), MIN_SENSING_DISTANCE);
        assert_eq!(agent.optimal_separation(), 42.0);
    }
}

#[test]
fn enforce_containment_by_index() {
    let params = AgentParams::default().at(-4.0, 130.0);
    let mut population = build(Bounds::new(100.0, 100.0), &[params], Behaviours::none());
    let heading = population.agents()[0].heading();

    assert!(population.enforce_containment(0));
    assert_eq!(population.agents()[0].position(), (0.0, 100.0));
    assert_eq!(population.agents()[0].heading(), heading);
    assert!(!population.enforce_containment(0));
    assert!(!population.enforce_containment(7));
}

#[test]
fn busy_flock_stays_on_the_plane() {
    let mut population = Population::new(&seeded(60));
    for _ in 0..200 {
        population.tick();
        let bounds = population.bounds();
        for agent in population.agents() {
            assert!(bounds.contains(agent.x(), agent.y()));
            assert!(agent.heading() >= 0.0 && agent.heading() < std::f64::consts::TAU);
        }
    }
    assert_eq!(population.ticks(), 200);
}
