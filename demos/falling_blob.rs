use softblob::*;

fn main() {
    let config = SimulationConfig::new().with_recycle_bounds(Some(WorldBounds::new(
        Vec2::new(-200.0, -200.0),
        Vec2::new(1_000.0, 1_000.0),
    )));
    let mut engine = BlobEngine::new(config.clone());
    engine.set_parallel_enabled(true);

    let geometry = match BlobGeometry::new(160.0, 184.0, 80) {
        Ok(geometry) => geometry,
        Err(err) => {
            eprintln!("bad geometry: {err}");
            return;
        }
    };
    let blob = match engine.spawn_blob(Vec2::new(400.0, 250.0), geometry) {
        Ok(id) => id,
        Err(err) => {
            eprintln!("spawn failed: {err}");
            return;
        }
    };

    engine.add_obstacle(Obstacle::circle(Vec2::new(400.0, 700.0), 40.0, &config));
    engine.add_obstacle(Obstacle::square(Vec2::new(250.0, 620.0), 35.0, &config));
    engine.add_obstacle(Obstacle::triangle(Vec2::new(560.0, 640.0), 40.0, &config));

    for second in 0..5 {
        for _ in 0..60 {
            engine.step(1.0 / 60.0);
        }
        let snapshot = engine.snapshot();
        println!(
            "t={}s blobs={} obstacles={}",
            second + 1,
            snapshot.blobs.len(),
            snapshot.obstacles.len()
        );
        if let Some(state) = snapshot.blob(blob) {
            println!("  parent blob hub at {:?}", state.hub);
        }
        for child in snapshot.blobs.iter().filter(|b| b.is_child) {
            println!("  child {:?} hub at {:?}", child.id, child.hub);
        }
    }
}
