use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use flocksim::prelude::*;

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("population_tick");

    for count in [50usize, 200, 500] {
        let config = PopulationConfig {
            width: 1280.0,
            height: 720.0,
            count,
            seed: Some(17),
            ..PopulationConfig::default()
        };

        group.bench_with_input(BenchmarkId::from_parameter(count), &config, |b, config| {
            let mut population = Population::new(config);
            b.iter(|| black_box(population.tick()));
        });
    }

    group.finish();
}

fn bench_steering(c: &mut Criterion) {
    let population = Population::new(&PopulationConfig {
        count: 100,
        seed: Some(3),
        ..PopulationConfig::default()
    });
    let agent = &population.agents()[0];
    let neighbours: Vec<Neighbour> = population.agents().iter().skip(1).map(Neighbour::of).collect();

    c.bench_function("steering_terms_100_neighbours", |b| {
        b.iter(|| {
            black_box(agent.seek_centre_neighbours(&neighbours))
                + black_box(agent.avoid_neighbours(&neighbours))
                + black_box(agent.align_with_neighbours(&neighbours))
        })
    });
}

criterion_group!(benches, bench_tick, bench_steering);
criterion_main!(benches);
