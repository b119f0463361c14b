use quadforce::quadtree::point_repulsion;
use quadforce::{
    Area, Body, BodySpec, QuadTree, Simulation, SimulationParameters, SpringSpec, Vector,
    brute_force_repulsion,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Bodies spread evenly over a `side` x `side` square by an additive recurrence
fn scattered_bodies(count: usize, side: f64) -> Vec<Body> {
    const A1: f64 = 0.7548776662466927;
    const A2: f64 = 0.5698402909980532;
    (0..count)
        .map(|i| {
            let n = i as f64 + 1.0;
            let point = Vector::new((0.5 + A1 * n).fract() * side, (0.5 + A2 * n).fract() * side);
            Body::new(format!("b{i}").into(), 1.0 + (i % 3) as f64, point)
        })
        .collect()
}

fn random_graph(params: SimulationParameters, bodies: usize, springs: usize) -> Simulation {
    let mut rng = ChaCha8Rng::seed_from_u64(17);
    let mut sim = Simulation::new(params.with_seed(17)).unwrap();
    for i in 0..bodies {
        let mass = rng.random_range(0.5..4.0);
        sim.upsert_body(BodySpec::new(format!("n{i}")).with_mass(mass))
            .unwrap();
    }
    for _ in 0..springs {
        let a = rng.random_range(0..bodies);
        let b = rng.random_range(0..bodies);
        let stiffness = rng.random_range(0.0..0.05);
        sim.upsert_spring(
            SpringSpec::new(format!("n{a}"), format!("n{b}")).with_stiffness(stiffness),
        )
        .unwrap();
    }
    sim
}

#[test]
fn two_bodies_settle_at_the_spring_rest_length() {
    let params = SimulationParameters {
        area: None,
        repulsion: 25.0,
        friction: 0.5,
        centripetal: 0.0,
        speed_limit: 20.0,
        ..SimulationParameters::default()
    };
    let mut sim = Simulation::new(params).unwrap();
    sim.upsert_body(BodySpec::new("A").with_mass(1.0).at(0.0, 0.0))
        .unwrap();
    sim.upsert_body(BodySpec::new("B").with_mass(1.0).at(100.0, 0.0))
        .unwrap();
    sim.upsert_spring(
        SpringSpec::new("A", "B")
            .with_length_at_rest(50.0)
            .with_stiffness(0.01),
    )
    .unwrap();

    let mut energy = f64::NAN;
    for _ in 0..500 {
        energy = sim.tick(0.2);
    }

    let a = sim.position_of(&"A".into()).unwrap();
    let b = sim.position_of(&"B".into()).unwrap();
    let distance = a.distance(b);
    assert!(
        (distance - 50.0).abs() <= 2.5,
        "distance {distance} is not within 5% of 50"
    );
    assert!(energy < 0.1, "energy {energy} did not drop");
}

#[test]
fn root_mass_is_the_total_body_mass() {
    let mut sim = random_graph(SimulationParameters::default(), 250, 0);

    sim.tick(0.2);

    let total: f64 = sim.bodies().iter().map(|b| b.mass).sum();
    let root = sim.index().root().unwrap();
    assert!((root.mass - total).abs() <= 1e-9 * total);
}

#[test]
fn repulsion_approaches_brute_force_as_threshold_shrinks() {
    let side = 1e5;
    let bodies = scattered_bodies(200, side);
    let area = Area::new(Vector::ZERO, Vector::new(side, side));

    let mut errors = Vec::new();
    for threshold in [1.0, 0.5, 0.25, 0.1, 0.0] {
        let mut index = QuadTree::new(threshold);
        let stats = index.rebuild(area, &bodies);
        assert_eq!(stats.leaves, bodies.len(), "every body owns a leaf");

        let (mut error, mut scale) = (0.0, 0.0);
        for (slot, body) in bodies.iter().enumerate() {
            let approx = index.repulsion_at(slot, body.position, 25.0, 1.0);
            let exact = brute_force_repulsion(&bodies, slot, 25.0, 1.0);
            error += (approx - exact).length();
            scale += exact.length();
        }
        errors.push(error / scale);
    }

    assert!(
        errors.windows(2).all(|pair| pair[1] < pair[0]),
        "errors do not shrink: {errors:?}"
    );
    assert!(errors[1] < 0.05, "default threshold error {}", errors[1]);
    assert!(errors[4] < 1e-12, "exact threshold error {}", errors[4]);
}

#[test]
fn pinned_body_survives_any_number_of_ticks() {
    let mut sim = random_graph(SimulationParameters::default(), 60, 120);
    let hub = "n0".into();
    sim.reposition(&hub, Vector::new(123.25, 456.5)).unwrap();
    for i in 1..60 {
        sim.upsert_spring(SpringSpec::new("n0", format!("n{i}")).with_stiffness(0.02))
            .unwrap();
    }

    for _ in 0..300 {
        sim.tick(0.2);
        assert_eq!(sim.position_of(&hub), Some(Vector::new(123.25, 456.5)));
    }
}

#[test]
fn random_graphs_never_produce_nan() {
    for params in [
        SimulationParameters::default(),
        SimulationParameters::unbounded(),
        SimulationParameters {
            threshold: 0.0,
            speed_limit: 20.0,
            friction: 0.9,
            ..SimulationParameters::default()
        },
    ] {
        let mut sim = random_graph(params, 120, 240);
        // A few bodies stacked on the same point
        for i in 0..4 {
            sim.upsert_body(BodySpec::new(format!("n{i}")).at(250.0, 250.0))
                .unwrap();
        }

        for _ in 0..300 {
            let energy = sim.tick(0.2);
            assert!(energy.is_finite() && energy >= 0.0);
        }
        assert!(sim.bodies().iter().all(|b| b.position.is_finite()));
    }
}

#[test]
fn bounded_layout_stays_inside_the_area() {
    let mut sim = random_graph(SimulationParameters::default(), 80, 160);
    let area = Area::default();

    for _ in 0..200 {
        sim.tick(0.5);
        assert!(sim.bodies().iter().all(|b| area.contains(b.position)));
    }
}

#[test]
fn bodies_outside_the_area_are_silently_skipped() {
    let mut sim = Simulation::new(SimulationParameters::default()).unwrap();
    sim.upsert_body(BodySpec::new("inside").with_mass(2.0).at(400.0, 300.0))
        .unwrap();
    sim.upsert_body(BodySpec::new("outside").at(1000.0, 300.0))
        .unwrap();

    let energy = sim.tick(0.2);

    assert!(energy.is_finite());
    assert_eq!(sim.index().stats().outside, 1);
    assert_eq!(sim.index().root().unwrap().mass, 2.0);
    // The outsider neither pushes the indexed body nor breaks the tick
    assert_eq!(
        sim.position_of(&"inside".into()),
        Some(Vector::new(400.0, 300.0))
    );
    assert!(sim.position_of(&"outside".into()).unwrap().is_finite());
}

#[test]
fn coincident_bodies_exert_no_force_on_each_other() {
    let point = Vector::new(42.0, 42.0);
    let bodies = vec![
        Body::new("a".into(), 1.0, point),
        Body::new("b".into(), 3.0, point),
    ];
    let mut index = QuadTree::new(0.5);
    index.rebuild(Area::default(), &bodies);

    for slot in 0..2 {
        assert_eq!(index.repulsion_at(slot, point, 25.0, 1.0), Vector::ZERO);
        assert_eq!(brute_force_repulsion(&bodies, slot, 25.0, 1.0), Vector::ZERO);
    }
    assert_eq!(point_repulsion(point, 3.0, point, 25.0), Vector::ZERO);
}

#[test]
fn driven_run_settles_a_small_graph() {
    let params = SimulationParameters {
        friction: 0.5,
        ..SimulationParameters::default().with_seed(5)
    };
    let mut sim = Simulation::new(params).unwrap();
    for id in ["a", "b", "c", "d"] {
        sim.upsert_body(BodySpec::new(id)).unwrap();
    }
    for (a, b) in [("a", "b"), ("b", "c"), ("c", "d"), ("d", "a")] {
        sim.upsert_spring(SpringSpec::new(a, b).with_stiffness(0.01))
            .unwrap();
    }

    let report = sim.run_until_settled(0.2, 0.06, 5000);

    assert!(report.settled, "not settled: {report:?}");
    assert!(report.energy <= 0.06);
    assert!(report.ticks >= 1);
}
