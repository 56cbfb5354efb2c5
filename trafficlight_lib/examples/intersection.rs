extern crate trafficlight_lib;

use std::io::Write;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Local;
use clap::Parser;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use tracing::info;
use tracing_subscriber::EnvFilter;

use trafficlight_lib::config::ControllerConfigBuilder;
use trafficlight_lib::controller::PhaseController;
use trafficlight_lib::phase::{Phase, PhaseChange};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of vehicles queueing at the light
    #[arg(short, long, default_value_t = 3)]
    vehicles: usize,

    /// Number of phase changes to show before exiting
    #[arg(short, long, default_value_t = 6)]
    cycles: usize,

    /// Shortest time a phase is held, in milliseconds
    #[arg(long, default_value_t = 4000)]
    dwell_min_ms: u64,

    /// Upper bound on the time a phase is held, in milliseconds
    #[arg(long, default_value_t = 6000)]
    dwell_max_ms: u64,

    /// Seed for the dwell generator
    #[arg(long)]
    seed: Option<u64>,

    /// Print each phase change as a JSON line instead of coloured text
    #[arg(long)]
    json: bool,
}

fn print_change(change: &PhaseChange<Phase>, json: bool) {
    if json {
        println!("{}", serde_json::to_string(change).unwrap());
        return;
    }
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let color = match change.phase {
        Phase::Red => Color::Red,
        Phase::Green => Color::Green,
    };
    write!(&mut stdout, "[{}] light is ", Local::now().format("%H:%M:%S%.3f")).unwrap();
    stdout
        .set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))
        .unwrap();
    write!(&mut stdout, "{}", change.phase).unwrap();
    stdout.reset().unwrap();
    writeln!(&mut stdout, " (previous phase held {:.2?})", change.dwell).unwrap();
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let mut builder = ControllerConfigBuilder::new().dwell(
        Duration::from_millis(args.dwell_min_ms),
        Duration::from_millis(args.dwell_max_ms),
    );
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    let config = match builder.build() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {}", err);
            std::process::exit(2);
        }
    };

    let light = Arc::new(PhaseController::<Phase>::with_config(config));
    let observer = light.subscribe();
    let handle = light.start().unwrap();

    let mut vehicles: Vec<thread::JoinHandle<()>> = Vec::new();
    for id in 0..args.vehicles {
        let light = Arc::clone(&light);
        vehicles.push(thread::spawn(move || {
            info!(vehicle = id, "waiting for green");
            light.wait_for_phase(Phase::Green);
            info!(vehicle = id, "crossing the intersection");
        }));
    }

    for _ in 0..args.cycles {
        let change = observer.next_change();
        print_change(&change, args.json);
    }

    // vehicles that never received a green flip stay parked; process exit reclaims them
    for vehicle in vehicles.into_iter().filter(|v| v.is_finished()) {
        vehicle.join().unwrap();
    }
    handle.join().unwrap();
}
