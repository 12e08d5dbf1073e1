//! Command-line front end for the simulator.
//!
//! Reads a JSON configuration (default `network_variables.json`), assembles
//! the network and runs the simulation with the trace stream on stdout.
//! Fatal failures print one diagnostic line and exit non-zero, with distinct
//! codes per error category.

use std::env;
use std::fs;
use std::io;
use std::process;

use getopts::Options;

use distsim::{Config, Error, ErrorKind, NetworkBuilder, Result, Summary};

const DEFAULT_CONFIG: &str = "network_variables.json";

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();
    if let Err(err) = run(&args) {
        eprintln!("error: {}", err);
        process::exit(exit_code(&err));
    }
}

fn run(args: &[String]) -> Result<Summary> {
    let mut opts = Options::new();
    opts.optopt(
        "c",
        "config",
        &format!("path to the JSON configuration (default: {})", DEFAULT_CONFIG),
        "FILE",
    );
    opts.optopt("s", "seed", "seed for the simulation RNG", "SEED");
    opts.optflag("h", "help", "print this help");
    let matches = opts
        .parse(&args[1..])
        .map_err(|err| ErrorKind::InvalidConfiguration(err.to_string()))?;
    if matches.opt_present("h") {
        print!("{}", opts.usage("Usage: distsim [options]"));
        return Ok(Summary::default());
    }

    let path = matches
        .opt_str("c")
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let text = fs::read_to_string(&path)?;
    let config = Config::from_json(&text)?;

    let mut builder = NetworkBuilder::new(config);
    builder.trace(Box::new(io::stdout()));
    if let Some(seed) = matches.opt_str("s") {
        let seed = seed.parse().map_err(|_| {
            ErrorKind::InvalidConfiguration(format!("seed must be an integer, got {:?}", seed))
        })?;
        builder.seed(seed);
    }

    let mut network = builder.build()?;
    network.run()
}

fn exit_code(err: &Error) -> i32 {
    match err.kind() {
        ErrorKind::InvalidConfiguration(_) => 2,
        ErrorKind::AlgorithmLoadFailed(_) => 3,
        ErrorKind::NotConnected => 4,
        _ => 1,
    }
}
