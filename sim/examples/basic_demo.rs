//! Basic demonstration of the Apostle simulation.
//!
//! Run with: RUST_LOG=debug cargo run --example basic_demo

use apostle_sim::{Cell, Kind, Point, SimConfig, SimWorld, Terrain};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    println!("=== Apostle - Simulation Demo ===\n");

    let config = SimConfig::default();
    let mut terrain = Terrain::new(20, 12);
    // A wall with a single gap, plus a fenced cell.
    for y in 0..10 {
        terrain.fill(10, y, Cell::SOLID)?;
    }
    terrain.fill(5, 5, Cell::BORDER_NORTH | Cell::BORDER_EAST)?;

    let mut sim = SimWorld::with_terrain(config, terrain)?;
    let human = sim.spawn_human(Point::new(1, 1))?;
    sim.spawn_apple(Point::new(17, 2))?;

    println!("Initial state:");
    print_grid(&sim);

    for _ in 0..6 {
        sim.step(100)?;
        for moved in sim.drain_moved() {
            println!("  entity {} stepped {} -> {}", moved.entity, moved.from, moved.to);
        }
    }
    println!("\n--- Tick {} ---", sim.current_tick());
    print_grid(&sim);

    // Drop a new apple by "clicking" on cell (3, 10).
    let cell_size = sim.config().cell_size;
    println!("\n--- Pointer press at cell (3, 10) ---\n");
    sim.pointer_pressed(3 * cell_size + 1, 10 * cell_size + 1);
    sim.step(1000)?;
    for acquired in sim.drain_target_acquired() {
        println!("  agent {} now targets {}", acquired.agent, acquired.target);
    }
    println!("--- Tick {} ---", sim.current_tick());
    print_grid(&sim);

    if let Some(record) = sim.entity(human) {
        println!("\nHuman {} rests at {}", human, record.position);
    }

    println!("\n=== Final State (JSON) ===\n");
    println!("{}", sim.snapshot().to_json_pretty()?);
    Ok(())
}

fn print_grid(sim: &SimWorld) {
    let snapshot = sim.snapshot();
    let terrain = sim.terrain();
    let mut row = String::new();
    for step in terrain.walk() {
        let here = Point::new(step.x, step.y);
        let glyph = match snapshot.entities.iter().find(|e| e.cell == here) {
            Some(e) => match e.kind {
                Kind::Human => '@',
                Kind::Apple => 'a',
                Kind::None => '?',
            },
            None if step.cell.contains(Cell::SOLID) => '#',
            None if !step.cell.is_empty() => '+',
            None => '.',
        };
        row.push(glyph);
        if step.x as usize + 1 == terrain.width() {
            println!("  {}", row);
            row.clear();
        }
    }
}
