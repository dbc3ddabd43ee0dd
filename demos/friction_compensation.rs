// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use log::{info, warn, LevelFilter};

use jaco::{JacoResult, SessionConfig, SimulatedArm, Supervisor, TelemetryArchive, JACO2_DOF};

/// An example tracking a fixed joint target with friction compensation.
///
/// The arm is moved to its home pose, then a joint PD controller drives it to the target
/// while the estimated friction torque is added to every command. The telemetry of the
/// session is written to the output directory and can be compared between different
/// friction parameters.
///
/// The session drives a simulated Jaco2. Before replacing it with an
/// ArmInterface implementation for a real arm, make sure there is
/// enough space around the robot and the emergency stop is at hand.
#[derive(Parser, Debug)]
#[clap(author, version, name = "friction_compensation")]
struct CommandLineArguments {
    /// TOML file with the session configuration. Uses the default session if absent.
    #[clap(short, long, value_parser)]
    pub config: Option<PathBuf>,
    /// Number of control cycles, overrides the configuration
    #[clap(short, long, value_parser)]
    pub loop_limit: Option<usize>,
    /// Decay of the friction smoothing filter, overrides the configuration
    #[clap(short, long, value_parser)]
    pub smoothing: Option<f64>,
    /// Directory the telemetry is written to
    #[clap(short, long, value_parser, default_value = "friction_compensation")]
    pub output_dir: PathBuf,
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
        None => SessionConfig::default(),
    };
    if let Some(loop_limit) = args.loop_limit {
        config.session.loop_limit = loop_limit;
    }
    if args.smoothing.is_some() {
        config.friction.smoothing = args.smoothing;
    }
    config.telemetry.output_dir = Some(args.output_dir.clone());
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
    let error = report
        .record
        .signal("error")
        .and_then(|x| x.data.first().copied())
        .unwrap_or(0.);
    info!(
        "ran {} cycles ({:?}), torque error {:.4} Nm",
        report.cycles, report.exit, error
    );
    if report.cycles > 0 {
        let stored = TelemetryArchive::load(&args.output_dir)?;
        info!(
            "telemetry of {} cycles stored in {:?}",
            stored.cycles(),
            args.output_dir
        );
    }
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
