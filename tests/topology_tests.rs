use softblob::*;

const DT: f32 = 1.0 / 60.0;

fn config() -> SimulationConfig {
    SimulationConfig::new().with_gravity_scale(0.0)
}

fn big_ring() -> BlobGeometry {
    BlobGeometry::new(90.0, 114.0, 40).expect("valid geometry")
}

#[test]
fn obstacle_inside_blob_splits_it_once() {
    let config = config();
    let mut world = SoftBodyWorld::new(DT);
    let parent = world.spawn_blob(Vec2::new(400.0, 300.0), big_ring(), &config).expect("spawn");
    world.add_obstacle(
        Obstacle::circle(Vec2::new(400.0, 300.0), 20.0, &config).with_velocity(Vec2::new(0.0, 40.0)),
    );

    world.tick(&config, &PointerState::default());

    let event = world.last_topology().split.expect("split on first tick");
    assert_eq!(event.parent, parent);
    assert!(world.blob(parent).is_none());
    assert_eq!(world.blob_count(), 2);
    for id in event.children {
        let child = world.blob(id).expect("child");
        assert!(child.is_child);
        assert_eq!(child.vertex_count(), 20);
        assert_eq!(child.points.len(), 2 * 20 + 1);
    }

    let (a, b) = (
        world.blob(event.children[0]).expect("child").hub().position,
        world.blob(event.children[1]).expect("child").hub().position,
    );
    // Obstacle falls along +y, so the cut runs along x.
    assert!((a.y - b.y).abs() < 1.0);
    assert!((a.x - b.x).abs() > 100.0);

    world.tick(&config, &PointerState::default());
    assert!(world.last_topology().split.is_none());
    assert_eq!(world.blob_count(), 2);
}

#[test]
fn split_respects_disabled_flag() {
    let config = config().with_split_enabled(false);
    let mut world = SoftBodyWorld::new(DT);
    world.spawn_blob(Vec2::new(400.0, 300.0), big_ring(), &config).expect("spawn");
    world.add_obstacle(Obstacle::circle(Vec2::new(400.0, 300.0), 20.0, &config));

    for _ in 0..10 {
        world.tick(&config, &PointerState::default());
    }
    assert_eq!(world.blob_count(), 1);
}

#[test]
fn cooldown_spaces_out_splits() {
    let config = config().with_split_cooldown(0.5);
    let mut world = SoftBodyWorld::new(DT);
    world.spawn_blob(Vec2::new(200.0, 300.0), big_ring(), &config).expect("spawn");
    world.spawn_blob(Vec2::new(600.0, 300.0), big_ring(), &config).expect("spawn");
    world.add_obstacle(Obstacle::circle(Vec2::new(200.0, 300.0), 10.0, &config));
    world.add_obstacle(Obstacle::circle(Vec2::new(600.0, 300.0), 10.0, &config));

    world.tick(&config, &PointerState::default());
    assert_eq!(world.blob_count(), 3);

    let mut ticks_until_second = 0;
    while world.blob_count() == 3 && ticks_until_second < 120 {
        world.tick(&config, &PointerState::default());
        ticks_until_second += 1;
    }
    assert_eq!(world.blob_count(), 4);
    assert!(ticks_until_second >= 29, "second split after {ticks_until_second} ticks");
}

#[test]
fn child_blob_absorbs_and_shrinks_obstacle() {
    let config = config();
    let mut world = SoftBodyWorld::new(DT);
    let mut child = Blob::new(Vec2::new(400.0, 300.0), BlobGeometry::new(80.0, 100.0, 32).expect("valid"), &config);
    child.is_child = true;
    let blob = world.insert_blob(child);
    let obstacle = world.add_obstacle(Obstacle::circle(Vec2::new(420.0, 300.0), 10.0, &config));

    world.tick(&config, &PointerState::default());
    assert_eq!(world.last_topology().attached, 1);
    assert_eq!(world.blob_count(), 1);

    for _ in 0..240 {
        world.tick(&config, &PointerState::default());
    }

    let snapshot = world.snapshot();
    let absorbed = snapshot.obstacle(obstacle).expect("obstacle");
    assert_eq!(absorbed.attached_to, Some(blob));
    assert!((absorbed.size - 10.0 * config.attach_orbit.size_scale).abs() < 1e-3);
    let hub = snapshot.blob(blob).expect("blob").hub;
    assert!(absorbed.position.distance(hub) < 80.0);
}

#[test]
fn clearing_attachments_releases_obstacles() {
    let config = config();
    let mut world = SoftBodyWorld::new(DT);
    let mut child = Blob::new(Vec2::new(400.0, 300.0), BlobGeometry::new(80.0, 100.0, 32).expect("valid"), &config);
    child.is_child = true;
    world.insert_blob(child);
    let obstacle = world.add_obstacle(Obstacle::circle(Vec2::new(400.0, 300.0), 10.0, &config));

    world.tick(&config, &PointerState::default());
    assert!(world.obstacle(obstacle).expect("obstacle").is_attached());

    world.clear_attachments();
    assert!(!world.obstacle(obstacle).expect("obstacle").is_attached());

    world.clear_obstacles();
    assert_eq!(world.obstacle_count(), 0);
}

#[test]
fn trails_follow_moving_obstacles() {
    let config = config();
    let mut world = SoftBodyWorld::new(DT);
    let id = world.add_obstacle(
        Obstacle::circle(Vec2::new(100.0, 100.0), 10.0, &config).with_velocity(Vec2::new(600.0, 0.0)),
    );

    for _ in 0..20 {
        world.tick(&config, &PointerState::default());
    }

    let trail = &world.obstacle(id).expect("obstacle").trail;
    assert!(trail.len() > 2);
    for pair in trail.iter().collect::<Vec<_>>().windows(2) {
        assert!(pair[0].distance(*pair[1]) >= config.trail_min_distance - 1e-4);
    }
}
