//! Loads the daemon's configuration: the immutable plant parameters
//! (`boiler_api::Config`) plus a couple of daemon-level knobs (log
//! level, the tick-feed file for the demo driver).

use boiler_api::{Error, Result};
use serde_derive::Deserialize;
use std::env;
use tracing::Level;

fn def_log_level() -> String {
    String::from("warn")
}

/// The on-disk (TOML) configuration for `boilerd`.
#[derive(Deserialize)]
pub struct Config {
    #[serde(default = "def_log_level")]
    log_level: String,

    /// The plant parameters from §3 of the spec, flattened into this
    /// same TOML document.
    #[serde(flatten)]
    pub plant: boiler_api::Config,

    /// Path to a newline-delimited-JSON file of tick bundles for the
    /// demo driver. `None` means read from stdin.
    pub input: Option<String>,
}

impl Config {
    pub fn get_log_level(&self) -> Level {
        match self.log_level.as_str() {
            "info" => Level::INFO,
            "debug" => Level::DEBUG,
            "trace" => Level::TRACE,
            _ => Level::WARN,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: def_log_level(),
            plant: boiler_api::Config {
                capacity: 1000.0,
                normal_lo: 400.0,
                normal_hi: 600.0,
                safety_lo: 100.0,
                safety_hi: 900.0,
                pumps: 4,
                pump_capacity: 5.0,
                max_steam: 10.0,
                evac_rate: 10.0,
            },
            input: None,
        }
    }
}

/// The subset of command-line flags that override the file-based
/// configuration. Parsed exactly once from `std::env::args()`.
struct CmdLine {
    config: Option<String>,
    input: Option<String>,
    verbosity: u8,
    print_cfg: bool,
}

fn parse_cmdline() -> CmdLine {
    use clap::{crate_version, Arg, ArgAction, Command};

    let matches = Command::new("Steam Boiler Controller")
        .version(crate_version!())
        .about("Safety-critical feedback controller for a steam boiler")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .action(ArgAction::Set)
                .value_name("FILE")
                .help("Specifies the configuration file"),
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .action(ArgAction::Set)
                .value_name("FILE")
                .help("Feeds ticks from a newline-delimited-JSON file instead of stdin"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Sets verbosity of log; can be used more than once"),
        )
        .arg(
            Arg::new("print_cfg")
                .long("print-config")
                .action(ArgAction::SetTrue)
                .help("Displays the configuration and exits"),
        )
        .get_matches();

    CmdLine {
        config: matches.get_one::<String>("config").cloned(),
        input: matches.get_one::<String>("input").cloned(),
        verbosity: matches.get_count("verbose"),
        print_cfg: matches.get_flag("print_cfg"),
    }
}

fn apply_cmdline(mut cfg: Config, args: &CmdLine) -> Config {
    if let Some(input) = &args.input {
        cfg.input = Some(input.clone());
    }

    match args.verbosity {
        0 => (),
        1 => cfg.log_level = String::from("info"),
        2 => cfg.log_level = String::from("debug"),
        _ => cfg.log_level = String::from("trace"),
    };

    cfg
}

fn parse_config(contents: &str) -> Result<Config> {
    toml::from_str(contents)
        .map_err(|e| Error::ConfigError(format!("{}", e)))
        .and_then(|cfg: Config| {
            cfg.plant.validate()?;
            Ok(cfg)
        })
}

async fn from_file(path: &str) -> Option<Result<Config>> {
    use tokio::fs;

    if let Ok(contents) = fs::read(path).await {
        let contents = String::from_utf8_lossy(&contents);

        Some(parse_config(&contents))
    } else {
        None
    }
}

async fn find_cfg(explicit: Option<&str>) -> Result<Config> {
    const CFG_FILE: &str = "boiler.toml";

    if let Some(path) = explicit {
        return match from_file(path).await {
            Some(cfg) => cfg,
            None => Err(Error::ConfigError(format!(
                "couldn't read configuration file '{}'",
                path
            ))),
        };
    }

    let mut dirs = vec![String::from("./")];

    if let Ok(home) = env::var("HOME") {
        dirs.push(format!("{}/.", home))
    }
    dirs.push(String::from("/usr/local/etc/"));
    dirs.push(String::from("/etc/"));

    for dir in dirs {
        let file = format!("{}{}", &dir, CFG_FILE);

        if let Some(cfg) = from_file(&file).await {
            return cfg;
        }
    }
    Ok(Config::default())
}

fn dump_config(cfg: &Config) {
    println!("Configuration:");
    println!("    log level: {}", cfg.get_log_level());
    println!(
        "    plant: capacity={} normal=[{}, {}] safety=[{}, {}]",
        cfg.plant.capacity,
        cfg.plant.normal_lo,
        cfg.plant.normal_hi,
        cfg.plant.safety_lo,
        cfg.plant.safety_hi
    );
    println!(
        "    pumps: {} x capacity {}",
        cfg.plant.pumps, cfg.plant.pump_capacity
    );
    println!(
        "    max_steam: {}  evac_rate: {}",
        cfg.plant.max_steam, cfg.plant.evac_rate
    );
    match &cfg.input {
        Some(path) => println!("    input: {}", path),
        None => println!("    input: <stdin>"),
    }
}

#[tracing::instrument(name = "loading config")]
pub async fn get() -> Option<Config> {
    let args = parse_cmdline();

    match find_cfg(args.config.as_deref()).await {
        Ok(cfg) => {
            let cfg = apply_cmdline(cfg, &args);

            if args.print_cfg {
                dump_config(&cfg);
                None
            } else {
                Some(cfg)
            }
        }
        Err(e) => {
            println!("{}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toml_body() -> &'static str {
        r#"
capacity = 1000.0
normal_lo = 400.0
normal_hi = 600.0
safety_lo = 100.0
safety_hi = 900.0
pumps = 4
pump_capacity = 5.0
max_steam = 10.0
evac_rate = 10.0
"#
    }

    #[test]
    fn default_log_level_is_warn() {
        match toml::from_str::<Config>(toml_body()) {
            Ok(cfg) => assert_eq!(cfg.get_log_level(), Level::WARN),
            Err(e) => panic!("TOML parse error: {}", e),
        }
    }

    #[test]
    fn log_level_can_be_set() {
        let body = format!("{}\nlog_level = \"debug\"\n", toml_body());

        match toml::from_str::<Config>(&body) {
            Ok(cfg) => assert_eq!(cfg.get_log_level(), Level::DEBUG),
            Err(e) => panic!("TOML parse error: {}", e),
        }
    }

    #[test]
    fn rejects_invalid_plant_parameters() {
        let body = "capacity = 1000.0\nnormal_lo = 700.0\nnormal_hi = 600.0\nsafety_lo = 100.0\nsafety_hi = 900.0\npumps = 4\npump_capacity = 5.0\nmax_steam = 10.0\nevac_rate = 10.0\n";

        assert!(parse_config(body).is_err());
    }
}
