use particle_springs::*;

fn main() {
    let params = SimulationParams::default().with_step(0.01, 4);
    let mut simulation =
        Simulation::with_preset(params, Preset::Pendulum).expect("default parameters are valid");
    simulation.toggle_run();

    for integrator in [Integrator::ForwardEuler, Integrator::SymplecticEuler, Integrator::Rk4] {
        simulation.reset();
        simulation.system_mut().set_integrator(integrator);
        for _ in 0..200 {
            simulation.frame();
        }
        let bob = simulation.system().particles()[1].p;
        println!(
            "{:>18}: bob at ({:.2}, {:.2}) after t = {:.2}, energy {:.2}",
            integrator.name(),
            bob.x,
            bob.y,
            simulation.system().time(),
            simulation.system().total_energy()
        );
    }

    simulation.reset();
    simulation.system_mut().set_implicit(true);
    for _ in 0..200 {
        simulation.frame();
    }
    println!("{}", simulation.system().describe());
}
