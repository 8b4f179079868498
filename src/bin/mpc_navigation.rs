// Obstacle-aware MPC navigation along a circular reference.
//
// usage: mpc_navigation [config.toml]
//
// Logs every step at info level (override with RUST_LOG) and saves the run
// to img/mpc_navigation.svg.

use std::env;
use std::fs::create_dir_all;

use log::{error, info, warn};

use mobile_mpc::utils::{circular_trajectory, Visualizer};
use mobile_mpc::{MpcConfig, MpcController, MpcResult, Obstacles, Point2D, Pose2D, Simulator};

const OUTPUT_DIR: &str = "img";
const OUTPUT_FILE: &str = "img/mpc_navigation.svg";

fn run() -> MpcResult<()> {
    let config = match env::args().nth(1) {
        Some(path) => {
            info!("Loading configuration from {}", path);
            MpcConfig::load(&path)?
        }
        None => MpcConfig::default(),
    };
    let safety_margin = config.safety_margin;

    let trajectory = circular_trajectory(2.0, 50, Point2D::origin());
    let obstacles = Obstacles::from(vec![(-1.0, -1.0), (1.0, 1.0), (0.0, 2.0)]);
    let initial_state = Pose2D::new(0.0, -2.0, 0.0);

    let mut simulator = Simulator::new(MpcController::new(config)?);
    let log = simulator.run(initial_state, &trajectory, &obstacles)?;

    info!(
        "Finished {} steps, converged {:.0}%",
        log.steps(),
        100.0 * log.convergence_rate()
    );
    if let Some(error) = log.max_tracking_error(&trajectory) {
        info!("Max tracking error: {:.3} m", error);
    }
    if let Some(clearance) = log.min_clearance(&obstacles) {
        info!("Min obstacle clearance: {:.3} m", clearance);
    }

    let mut vis = Visualizer::new();
    vis.set_title("MPC navigation");
    vis.plot_reference(&trajectory)
        .plot_obstacles(&obstacles, Some(safety_margin))
        .plot_trajectory(&log.states)
        .plot_start(initial_state.position());
    if let Some(horizon) = log.horizons.last() {
        vis.plot_horizon(horizon);
    }
    if let Some(state) = log.final_state() {
        vis.plot_robot(state, 1.5);
    }

    create_dir_all(OUTPUT_DIR)?;
    match vis.save_svg(OUTPUT_FILE) {
        Ok(()) => info!("Plot saved to {}", OUTPUT_FILE),
        Err(e) => warn!("Could not save plot: {}", e),
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        error!("{}", e);
        std::process::exit(1);
    }
}
