use particle_springs::*;

fn paused_pendulum() -> Simulation {
    Simulation::with_preset(SimulationParams::default(), Preset::Pendulum).expect("valid setup")
}

#[test]
fn stepping_locks_editing_until_reset() {
    let mut simulation = paused_pendulum();
    assert!(simulation.session().can_edit());

    simulation.single_step();
    assert!(!simulation.session().can_edit());
    assert_eq!(
        simulation.press(Vec2::new(600.0, 400.0)),
        Ok(EditAction::None)
    );

    simulation.reset();
    assert!(simulation.session().can_edit());
    assert_eq!(
        simulation.press(Vec2::new(600.0, 400.0)),
        Ok(EditAction::CreationStarted)
    );
}

#[test]
fn reset_while_running_keeps_editing_locked() {
    let mut simulation = paused_pendulum();
    assert!(simulation.toggle_run());
    assert!(simulation.frame());
    simulation.reset();
    assert!(!simulation.session().can_edit());
    assert_eq!(simulation.system().time(), 0.0);
}

#[test]
fn paused_frames_do_not_advance() {
    let mut simulation = paused_pendulum();
    assert!(!simulation.frame());
    assert_eq!(simulation.system().time(), 0.0);
}

#[test]
fn new_particle_connects_to_nearby_particles() {
    let mut simulation = paused_pendulum();
    let point = Vec2::new(400.0, 200.0);

    assert_eq!(simulation.press(point), Ok(EditAction::CreationStarted));
    let id = simulation
        .release_press(point)
        .expect("valid ids")
        .expect("editing allowed");

    // bob is 80 away, the anchor about 128; both within reach
    assert_eq!(id, ParticleId(2));
    assert_eq!(simulation.system().particle_count(), 3);
    assert_eq!(simulation.system().spring_count(), 3);
}

#[test]
fn dragging_a_grabbed_particle_while_editing_moves_its_rest_state() {
    let mut simulation = paused_pendulum();
    let bob = simulation
        .grab(Vec2::new(321.0, 201.0))
        .expect("bob under pointer");
    assert!(simulation.system().particles()[bob.index()].pinned);

    simulation.drag(Vec2::new(320.0, 260.0)).expect("grabbed");
    simulation.release().expect("grabbed");

    let particle = &simulation.system().particles()[bob.index()];
    assert!(!particle.pinned);
    assert_eq!(particle.p0, Vec2::new(320.0, 260.0));
    let spring = simulation.system().springs().values().next().expect("one spring");
    assert!((spring.l0 - 160.0).abs() < 1e-4);
}

#[test]
fn held_particle_follows_pointer_while_running() {
    let mut simulation = paused_pendulum();
    simulation.toggle_run();
    let bob = simulation
        .grab(Vec2::new(320.0, 200.0))
        .expect("bob under pointer");

    simulation.drag(Vec2::new(300.0, 250.0)).expect("grabbed");
    simulation.frame();

    let particle = &simulation.system().particles()[bob.index()];
    assert_eq!(particle.p, Vec2::new(300.0, 250.0));
    assert_eq!(particle.v, Vec2::ZERO);
    assert_eq!(particle.p0, Vec2::new(320.0, 200.0));
}

#[test]
fn delete_removes_the_particle_and_its_springs() {
    let mut simulation = paused_pendulum();
    let removed = simulation
        .delete_near(Vec2::new(320.0, 102.0))
        .expect("valid ids")
        .expect("anchor under pointer");

    assert!(removed.pinned);
    assert_eq!(simulation.system().particle_count(), 1);
    assert_eq!(simulation.system().spring_count(), 0);
    assert_eq!(simulation.system().particles()[0].index, 0);
}

#[test]
fn clear_drops_any_grab() {
    let mut simulation = paused_pendulum();
    simulation.grab(Vec2::new(320.0, 200.0));
    simulation.clear();
    assert_eq!(simulation.session().grabbed(), None);
    assert_eq!(simulation.release(), Ok(None));
}
