//! CLI for the UPS power-management supervisor (upsmon)

#[cfg(all(feature = "cli", unix))]
use clap::Parser;
#[cfg(all(feature = "cli", unix))]
use colored::Colorize;
#[cfg(all(feature = "cli", unix))]
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(all(feature = "cli", unix))]
use std::sync::{mpsc, Arc};
#[cfg(all(feature = "cli", unix))]
use upsmonlib::config::{
    GPIO_PIN_AC_LOST, GPIO_PIN_PWR_BUTTON, GPIO_PIN_PWR_TRIGGER, I2C_BATTERY_ADDR, I2C_BUS,
};
#[cfg(all(feature = "cli", unix))]
use upsmonlib::events::EventDispatcher;
#[cfg(all(feature = "cli", unix))]
use upsmonlib::hw::{EdgeWatcher, GpioInput, GpioOutput, I2cBus};
#[cfg(all(feature = "cli", unix))]
use upsmonlib::power::SystemPower;
#[cfg(all(feature = "cli", unix))]
use upsmonlib::telemetry::TelemetrySource;
#[cfg(all(feature = "cli", unix))]
use upsmonlib::ui::{NullSink, PlainSink, StatusSink};
#[cfg(all(feature = "cli", unix))]
use upsmonlib::{Config, Monitor, UpsError};

#[cfg(all(feature = "cli", unix))]
#[derive(Parser)]
#[command(name = "upsmon")]
#[command(
    about = "UPS power management: battery telemetry, voltage-threshold shutdown, power-button handling",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Update interval in seconds (default: 2.0)
    #[arg(short = 'n', long, value_name = "seconds", value_parser = positive_f64)]
    interval: Option<f64>,

    /// Minimum battery voltage for auto-shutdown (default: 3.5)
    #[arg(long, value_name = "volts", value_parser = positive_f64)]
    min_voltage: Option<f64>,

    /// Enable the terminal dashboard
    #[arg(long)]
    ncurses: bool,

    /// Disable output
    #[arg(short, long)]
    quiet: bool,

    /// Watch only, without GPIO actuators
    #[arg(short, long)]
    watch: bool,

    /// Read settings from a TOML file; flags override its values
    #[arg(long, value_name = "path")]
    config: Option<String>,
}

#[cfg(all(feature = "cli", unix))]
fn positive_f64(s: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(format!("'{}' is not a positive value", s)),
    }
}

#[cfg(all(feature = "cli", unix))]
fn main() {
    env_logger::init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {}", "[!] Error:".red().bold(), e);
            std::process::exit(-1);
        }
    }
}

#[cfg(all(feature = "cli", unix))]
fn run(cli: Cli) -> upsmonlib::Result<i32> {
    let mut config = match &cli.config {
        Some(path) => Config::from_toml_file(path)?,
        None => Config::default(),
    };
    if let Some(interval) = cli.interval {
        config.interval_secs = interval;
    }
    if let Some(min_voltage) = cli.min_voltage {
        config.min_voltage = min_voltage;
    }
    if cli.ncurses {
        config.ncurses = true;
    }
    if cli.quiet {
        config.quiet = true;
    }
    if cli.watch {
        config.watch = true;
    }
    config.validate()?;

    if !nix::unistd::geteuid().is_root() {
        return Err(UpsError::PermissionDenied(
            "root privileges are needed to run upsmon".into(),
        ));
    }

    if config.watch && config.quiet {
        println!("[+] Both --watch and --quiet flags are set. Nothing to do.");
        return Ok(0);
    }

    let running = Arc::new(AtomicBool::new(true));
    {
        let r = running.clone();
        ctrlc::set_handler(move || r.store(false, Ordering::SeqCst)).map_err(|e| {
            UpsError::Configuration(format!("cannot install interrupt handler: {}", e))
        })?;
    }

    // GPIO actuation, skipped entirely in watch-only mode.
    let mut _power_enable: Option<GpioOutput> = None;
    let mut _dispatcher: Option<EventDispatcher> = None;
    if !config.watch {
        if config.min_voltage < 3.0 {
            eprintln!("{}", "[!] WARNING: min_voltage below 3V".yellow());
        }

        let mut enable = GpioOutput::open(GPIO_PIN_PWR_TRIGGER)?;
        enable.set_high()?;

        let button = GpioInput::open(GPIO_PIN_PWR_BUTTON)?;
        if button.is_high()? {
            // The button rests low; a high level before anyone touched it
            // means the line is miswired.
            return Err(UpsError::WiringFault("PWR_BUTTON is pulled high".into()));
        }
        let ac = GpioInput::open(GPIO_PIN_AC_LOST)?;

        let (tx, rx) = mpsc::channel();
        let _watcher = EdgeWatcher::new(button, ac, tx).spawn()?;
        _dispatcher = Some(EventDispatcher::spawn(rx, SystemPower)?);
        _power_enable = Some(enable);
    }

    let source = TelemetrySource::new(I2cBus::open(I2C_BUS, I2C_BATTERY_ADDR)?);

    let sink: Box<dyn StatusSink> = if config.quiet {
        Box::new(NullSink::new(running.clone()))
    } else if config.ncurses {
        dashboard_sink(config.interval_secs, running.clone())?
    } else {
        Box::new(PlainSink::new(running.clone()))
    };

    let mut monitor = Monitor::new(source, SystemPower, sink, config, running);
    monitor.run()
}

#[cfg(all(feature = "cli", unix))]
#[cfg(feature = "tui")]
fn dashboard_sink(
    interval_secs: f64,
    running: Arc<AtomicBool>,
) -> upsmonlib::Result<Box<dyn StatusSink>> {
    Ok(Box::new(upsmonlib::ui::TuiSink::new(
        interval_secs,
        running,
    )?))
}

#[cfg(all(feature = "cli", unix))]
#[cfg(not(feature = "tui"))]
fn dashboard_sink(
    _interval_secs: f64,
    _running: Arc<AtomicBool>,
) -> upsmonlib::Result<Box<dyn StatusSink>> {
    Err(UpsError::Configuration(
        "this build has no terminal dashboard (compile with --features tui)".into(),
    ))
}

#[cfg(not(all(feature = "cli", unix)))]
fn main() {
    eprintln!("CLI features not enabled. Please compile with --features cli");
    std::process::exit(1);
}
