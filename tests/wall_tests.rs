use approx::assert_relative_eq;
use particle_springs::*;

const WIDTH: f32 = 640.0;
const HEIGHT: f32 = 480.0;

fn bouncy(restitution: f32) -> ParticleSystem {
    let params = SimulationParams::default()
        .with_gravity(9.8, false)
        .with_restitution(restitution)
        .with_viewport(WIDTH, HEIGHT);
    ParticleSystem::new(params).expect("valid params")
}

#[test]
fn right_wall_rebound_scales_by_restitution() {
    for mode in [IntegrationMode::Explicit, IntegrationMode::Implicit] {
        let mut system = bouncy(0.5);
        system.set_mode(mode);
        let id = system.create_particle(Vec2::new(WIDTH - 1.0, 100.0), Vec2::new(100.0, 0.0));

        system.advance_time(0.05);

        let particle = system.particle(id).expect("particle exists");
        assert_eq!(particle.p.x, WIDTH, "{mode:?}");
        assert_relative_eq!(particle.v.x, -50.0, epsilon = 1e-4);
        assert_eq!(system.last_profile().wall_contacts, 1);
    }
}

#[test]
fn particles_never_leave_the_viewport() {
    let mut system = ParticleSystem::new(
        SimulationParams::default()
            .with_restitution(0.9)
            .with_viewport(WIDTH, HEIGHT),
    )
    .expect("valid params");
    for i in 0..8 {
        let angle = i as f32 * std::f32::consts::FRAC_PI_4;
        system.create_particle(
            Vec2::new(WIDTH / 2.0, HEIGHT / 2.0),
            Vec2::new(angle.cos(), angle.sin()) * 2000.0,
        );
    }
    system.set_integrator(Integrator::Midpoint);

    for _ in 0..200 {
        system.advance_time(0.01);
        for view in system.particle_views() {
            assert!((0.0..=WIDTH).contains(&view.position.x));
            assert!((0.0..=HEIGHT).contains(&view.position.y));
        }
    }
}

#[test]
fn floor_contact_with_zero_restitution_stops_the_fall() {
    let mut system = ParticleSystem::new(
        SimulationParams::default()
            .with_gravity(100.0, true)
            .with_viewport(WIDTH, HEIGHT),
    )
    .expect("valid params");
    let id = system.create_particle(Vec2::new(50.0, HEIGHT - 0.5), Vec2::new(0.0, 30.0));

    system.advance_time(0.05);

    let particle = system.particle(id).expect("particle exists");
    assert_eq!(particle.p.y, HEIGHT);
    assert_eq!(particle.v.y, 0.0);
    // the pending downward force is cleared as well
    assert_eq!(particle.f.y, 0.0);
}
