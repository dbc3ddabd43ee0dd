// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use log::{info, warn, LevelFilter};

use jaco::{JacoResult, SessionConfig, SimulatedArm, Supervisor, JACO2_DOF};

/// An example letting the arm float.
///
/// The arm is moved to its home pose in position mode. Then only the joint velocities are
/// damped in torque mode while the arm compensates gravity itself, so the arm can be pushed
/// around until the loop ends or Ctrl-C is pressed. Afterwards the arm is moved home again.
///
/// The session drives a simulated Jaco2. Have the emergency stop at hand before replacing
/// it with an ArmInterface implementation for a real arm.
#[derive(Parser, Debug)]
#[clap(author, version, name = "floating_controller")]
struct CommandLineArguments {
    /// TOML file with the session configuration. Uses the floating session if absent.
    #[clap(short, long, value_parser)]
    pub config: Option<PathBuf>,
    /// Number of control cycles, overrides the configuration
    #[clap(short, long, value_parser)]
    pub loop_limit: Option<usize>,
    /// Directory the telemetry is written to, overrides the configuration
    #[clap(short, long, value_parser)]
    pub output_dir: Option<PathBuf>,
    /// Log the command of every cycle
    #[clap(short, long, action)]
    pub verbose: bool,
}

fn main() -> JacoResult<()> {
    let args = CommandLineArguments::parse();
    init_logger(match args.verbose {
        true => LevelFilter::Trace,
        false => LevelFilter::Info,
    });
    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::floating(),
    };
    if let Some(loop_limit) = args.loop_limit {
        config.session.loop_limit = loop_limit;
    }
    if args.output_dir.is_some() {
        config.telemetry.output_dir = args.output_dir.clone();
    }
    config.validate::<JACO2_DOF>()?;

    let mut supervisor: Supervisor<JACO2_DOF, _> = Supervisor::new(
        SimulatedArm::jaco2(),
        config.controller()?,
        config.supervisor_config()?,
    )
    .with_target(config.target()?);
    if let Some(friction) = config.friction_estimator()? {
        supervisor = supervisor.with_friction(friction);
    }
    let token = supervisor.cancel_token();
    if let Err(e) = ctrlc::set_handler(move || token.cancel()) {
        warn!("cannot install the Ctrl-C handler: {}", e);
    }

    println!("Running the session on a simulated Jaco2.");
    let mut sink = config.telemetry_buffer::<JACO2_DOF>();
    let report = supervisor.run(&mut sink)?;
    if let Some(load) = report.initial_torque_load {
        info!("torque load at the home pose: {:?}", load);
    }
    info!(
        "floated for {} cycles ({:?}), {} homing timeouts",
        report.cycles, report.exit, report.homing_timeouts
    );
    Ok(())
}

fn init_logger(level: LevelFilter) {
    let start = Instant::now();
    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{:10.6} {:5}] {}",
                start.elapsed().as_secs_f64(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout())
        .apply()
        .expect("the logger is only initialized once");
}
