//! Main drive executable entry point.
//!
//! # Architecture
//!
//! The executable runs a fixed period control loop against an ideal model of
//! the drivetrain, in which every module achieves its demanded state
//! instantly. Each cycle consists of:
//!
//!     - Localisation: odometry from the modules and gyro
//!     - Control, either:
//!         - Trajectory control along a trajectory planned at startup, or
//!         - Manual control from a fixed operator input
//!     - Locomotion control
//!     - Actuation of the module model
//!
//! A background thread plays the part of a camera, observing the true pose
//! and delivering it to the pose estimator after a latency.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, error, info, warn};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};
use structopt::StructOpt;

// Internal
use drive_lib::{
    experiments::Experiment,
    geom::{Pose2, Twist2},
    kinematics::{self, ModulePosition, ModuleState, SwerveKinematics, NUM_MODULES},
    loc::{self, OdometryInput, PoseEstimator, SharedPoseEstimator, VisionMeasurement},
    loco_ctrl::{DriveDemand, InputData as LocoCtrlInput, LocoCtrl},
    manual_ctrl::{ManualDriver, ManualMode},
    traj::{self, TimingLimits, TrajectoryPlanner},
    traj_ctrl::{InputData as TrajCtrlInput, TrajCtrl},
};
use params::DriveExecParams;
use util::{
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    session::{self, Session},
    time::CycleTimer,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "drive_exec", about = "Swerve drive control loop")]
struct Opt {
    /// Drive manually in the given mode instead of following the trajectory.
    /// One of module_states, robot_relative, field_relative or snaps.
    #[structopt(short, long, parse(try_from_str = parse_manual_mode))]
    manual: Option<ManualMode>,

    /// Length of the run in seconds, by default one second longer than the
    /// trajectory.
    #[structopt(short, long)]
    duration_s: Option<f64>,

    /// Do not run the simulated camera.
    #[structopt(long)]
    no_vision: bool,

    /// Log at trace level rather than debug.
    #[structopt(short, long)]
    verbose: bool,
}

/// Ideal drivetrain which moves exactly as demanded, measured by slipping
/// wheel encoders and a perfect gyro.
struct ModuleEcho {
    kinematics: Arc<SwerveKinematics>,

    truth: Pose2,

    positions: [ModulePosition; NUM_MODULES],

    slip_factor: f64,
}

/// Simulated camera running in a background thread.
struct VisionSim {
    bg_jh: Option<JoinHandle<()>>,
    bg_run: Arc<AtomicBool>,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    color_eyre::install()?;

    let opt = Opt::from_args();

    // Initialise session
    let session = Session::new("drive_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    let level = if opt.verbose {
        LevelFilter::Trace
    }
    else {
        LevelFilter::Debug
    };
    logger_init(level, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Swerve Drive Executable\n");
    info!(
        "Running on: {}",
        host::get_hostname().unwrap_or_else(|| String::from("unknown host"))
    );
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opt);

    // ---- LOAD PARAMETERS ----

    let exec_params: DriveExecParams =
        util::params::load("drive_exec.toml").wrap_err("Could not load exec params")?;
    let kin_params: kinematics::Params =
        util::params::load("kinematics.toml").wrap_err("Could not load kinematics params")?;
    let planner_params: traj::Params =
        util::params::load("planner.toml").wrap_err("Could not load planner params")?;
    let pose_est_params: loc::Params =
        util::params::load("pose_est.toml").wrap_err("Could not load pose estimator params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let kinematics = Arc::new(
        SwerveKinematics::new(&kin_params).wrap_err("Invalid kinematics parameters")?,
    );
    info!(
        "Kinematics built, max speed {:.2} m/s, max rotation {:.2} rad/s",
        kinematics.limits().max_drive_velocity_ms,
        kinematics.max_angular_speed_rads()
    );

    let mut traj_ctrl = TrajCtrl::default();
    traj_ctrl
        .init("traj_ctrl.toml", &session)
        .wrap_err("Failed to initialise TrajCtrl")?;
    info!("TrajCtrl init complete");

    let mut loco_ctrl = LocoCtrl::new(kinematics.clone());
    loco_ctrl
        .init("loco_ctrl.toml", &session)
        .wrap_err("Failed to initialise LocoCtrl")?;
    info!("LocoCtrl init complete");

    let mut manual = ManualDriver::from_params_file(kinematics.clone(), "manual_ctrl.toml")
        .wrap_err("Failed to initialise manual control")?;
    info!("ManualCtrl init complete");

    let start_pose = Pose2::new(
        exec_params.start_pose[0],
        exec_params.start_pose[1],
        exec_params.start_pose[2],
    );
    let mut echo = ModuleEcho::new(kinematics.clone(), start_pose, exec_params.wheel_slip_factor);

    let estimator = SharedPoseEstimator::new(
        PoseEstimator::new(pose_est_params, kinematics.clone(), start_pose, &echo.measure())
            .wrap_err("Invalid pose estimator parameters")?,
    );
    info!("PoseEstimator init complete");

    info!("Module initialisation complete\n");

    // ---- PLAN TRAJECTORY ----

    let planner = TrajectoryPlanner::new(planner_params, kinematics.clone())
        .wrap_err("Invalid trajectory planner parameters")?;
    let waypoints: Vec<Pose2> = exec_params
        .waypoints
        .iter()
        .map(|w| Pose2::new(w[0], w[1], w[2]))
        .collect();
    let limits = TimingLimits {
        start_velocity_ms: 0.0,
        end_velocity_ms: 0.0,
        max_velocity_ms: exec_params.max_velocity_ms,
        max_abs_accel_mss: exec_params.max_abs_accel_mss,
    };

    let plan_start = Instant::now();
    let trajectory = Arc::new(
        planner
            .generate_trajectory(
                &waypoints,
                &exec_params.headings_rad,
                &planner.default_constraints(),
                &limits,
            )
            .wrap_err("Failed to plan the trajectory")?,
    );
    info!(
        "Planned trajectory of {} points lasting {:.2} s in {:.3} s",
        trajectory.len(),
        trajectory.duration_s(),
        plan_start.elapsed().as_secs_f64()
    );

    let traj_path = session
        .save_json("trajectory.json", &*trajectory)
        .wrap_err("Failed to save the trajectory")?;
    info!("Trajectory saved to {:?}\n", traj_path);

    traj_ctrl.set_trajectory(trajectory.clone());

    // ---- START VISION ----

    let truth = Arc::new(Mutex::new(start_pose));

    let mut vision = if opt.no_vision {
        info!("Simulated camera disabled");
        None
    }
    else {
        info!(
            "Starting simulated camera at {:.2} s period with {:.3} s latency",
            exec_params.vision_period_s, exec_params.vision_latency_s
        );
        Some(VisionSim::start(
            estimator.clone(),
            truth.clone(),
            Duration::from_secs_f64(exec_params.vision_period_s),
            Duration::from_secs_f64(exec_params.vision_latency_s),
        ))
    };

    // ---- MAIN LOOP ----

    let run_duration_s = opt
        .duration_s
        .unwrap_or_else(|| trajectory.duration_s() + 1.0);
    let veering_correction = exec_params
        .experiments
        .enabled(Experiment::UseVeeringCorrection);

    match opt.manual {
        Some(mode) => info!("Driving manually in {:?} mode for {:.2} s", mode, run_duration_s),
        None => info!("Following the trajectory for {:.2} s", run_duration_s),
    }

    let loop_start_s = session::get_elapsed_seconds();
    let mut timer = CycleTimer::new(Duration::from_secs_f64(exec_params.cycle_period_s));
    let mut finish_logged = false;

    loop {
        let time_s = session::get_elapsed_seconds();

        if time_s - loop_start_s > run_duration_s {
            break;
        }

        // ---- LOCALISATION ----

        estimator.update(time_s, &echo.measure());
        let state = estimator.get_state();

        // ---- CONTROL ----

        let demand = match opt.manual {
            Some(mode) => manual.apply(
                mode,
                &state,
                &exec_params.manual_input,
                &exec_params.experiments,
            ),
            None => {
                let input = TrajCtrlInput {
                    time_s: time_s - loop_start_s,
                    pose: state.pose,
                    velocity: state.velocity,
                };

                match traj_ctrl.proc(&input) {
                    Ok((speeds, report)) => {
                        if report.finished && !finish_logged {
                            info!(
                                "Trajectory complete, final error {:.4} m, {:.4} rad",
                                report.translation_error_m, report.heading_error_rad
                            );
                            finish_logged = true;
                        }
                        DriveDemand::RobotRelative(speeds)
                    }
                    Err(e) => {
                        error!("TrajCtrl error: {}", e);
                        DriveDemand::Stop
                    }
                }
            }
        };

        // ---- LOCOMOTION ----

        let loco_input = LocoCtrlInput {
            demand,
            heading_rad: state.pose.heading_rad,
            heading_rate_rads: state.theta.v,
            veering_correction,
        };

        let module_states = match loco_ctrl.proc(&loco_input) {
            Ok((output, report)) => {
                if report.desaturated {
                    debug!("Module speeds desaturated");
                }
                output.module_states
            }
            Err(e) => {
                error!("LocoCtrl error: {}", e);
                [ModuleState::default(); NUM_MODULES]
            }
        };

        // ---- ACTUATION ----

        echo.actuate(&module_states, exec_params.cycle_period_s);
        match truth.lock() {
            Ok(mut t) => *t = echo.truth,
            Err(_) => warn!("Truth pose lock poisoned, camera will not see the latest pose"),
        }

        // ---- CYCLE MANAGEMENT ----

        if let Some(overrun) = timer.wait() {
            warn!("Cycle overran by {:.06} s", overrun.as_secs_f64());
        }
    }

    // ---- SHUTDOWN ----

    if let Some(v) = vision.as_mut() {
        v.stop()?;
    }

    let final_state = estimator.get_state();
    let error = final_state.pose.relative_to(&echo.truth);
    info!(
        "Finished {} cycles ({} overruns), estimate is {:.4} m and {:.4} rad from the truth",
        timer.num_cycles(),
        timer.num_overruns(),
        error.position_m.norm(),
        error.heading_rad
    );
    if estimator.is_degraded() {
        warn!("Pose estimate finished with degraded heading");
    }

    session
        .save_json("final_state.json", &final_state)
        .wrap_err("Failed to save the final state")?;

    Ok(())
}

fn parse_manual_mode(s: &str) -> Result<ManualMode, String> {
    match s {
        "module_states" => Ok(ManualMode::ModuleStates),
        "robot_relative" => Ok(ManualMode::RobotRelative),
        "field_relative" => Ok(ManualMode::FieldRelative),
        "snaps" => Ok(ManualMode::Snaps),
        _ => Err(format!("Unknown manual mode \"{}\"", s)),
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ModuleEcho {
    fn new(kinematics: Arc<SwerveKinematics>, truth: Pose2, slip_factor: f64) -> Self {
        Self {
            kinematics,
            truth,
            positions: [ModulePosition::default(); NUM_MODULES],
            slip_factor,
        }
    }

    /// Move by the given module states held for `dt_s`.
    fn actuate(&mut self, states: &[ModuleState; NUM_MODULES], dt_s: f64) {
        let speeds = self.kinematics.to_chassis_speeds(states);
        self.truth = self.truth.exp(&Twist2::new(
            speeds.vx_ms * dt_s,
            speeds.vy_ms * dt_s,
            speeds.omega_rads * dt_s,
        ));

        for (pos, state) in self.positions.iter_mut().zip(states.iter()) {
            pos.distance_m += state.speed_ms * dt_s * self.slip_factor;
            pos.angle_rad = state.angle_rad;
        }
    }

    fn measure(&self) -> OdometryInput {
        OdometryInput::new(Some(self.truth.heading_rad), self.positions)
    }
}

impl VisionSim {
    fn start(
        estimator: SharedPoseEstimator,
        truth: Arc<Mutex<Pose2>>,
        period: Duration,
        latency: Duration,
    ) -> Self {
        let bg_run = Arc::new(AtomicBool::new(true));
        let bg_run_clone = bg_run.clone();

        let bg_jh = Some(thread::spawn(move || {
            bg_thread(estimator, truth, bg_run_clone, period, latency)
        }));

        Self { bg_jh, bg_run }
    }

    fn stop(&mut self) -> Result<(), Report> {
        self.bg_run.store(false, Ordering::Relaxed);

        match self.bg_jh.take() {
            Some(jh) => jh.join().map_err(|_| eyre!("The camera thread panicked")),
            None => Ok(()),
        }
    }
}

fn bg_thread(
    estimator: SharedPoseEstimator,
    truth: Arc<Mutex<Pose2>>,
    bg_run: Arc<AtomicBool>,
    period: Duration,
    latency: Duration,
) {
    while bg_run.load(Ordering::Relaxed) {
        thread::sleep(period);

        // Capture
        let timestamp_s = session::get_elapsed_seconds();
        let pose = match truth.lock() {
            Ok(t) => *t,
            Err(_) => {
                error!("Truth pose lock poisoned, stopping the camera");
                break;
            }
        };

        // Processing
        thread::sleep(latency);

        let measurement = VisionMeasurement {
            timestamp_s,
            pose,
            std_devs: None,
        };
        match estimator.add_vision(&measurement) {
            Ok(corrected) => debug!(
                "Vision at {:.3} s corrected the pose to ({:.3}, {:.3}, {:.3})",
                timestamp_s,
                corrected.x(),
                corrected.y(),
                corrected.heading_rad
            ),
            Err(e) => warn!("Vision measurement rejected: {}", e),
        }
    }
}
