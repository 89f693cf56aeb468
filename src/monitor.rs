//! Monitor loop
//!
//! The orchestrating scheduler: on a fixed interval, pulls a telemetry
//! sample, evaluates the voltage guard, and hands the sample to the
//! presentation sink. The guard always runs before any display update, so
//! an emergency shutdown is never delayed behind a UI refresh. The loop
//! spawns no threads of its own; asynchronous button/AC events are handled
//! by the event dispatcher and only ever touch the host power state.

use crate::config::Config;
use crate::error::Result;
use crate::guard::{self, GuardVerdict};
use crate::power::PowerController;
use crate::telemetry::{BatteryGauge, TelemetrySource};
use crate::ui::{StatusSink, WaitOutcome};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The poll-sleep monitor.
pub struct Monitor<G, P> {
    source: TelemetrySource<G>,
    power: P,
    sink: Box<dyn StatusSink>,
    config: Config,
    running: Arc<AtomicBool>,
}

impl<G: BatteryGauge, P: PowerController> Monitor<G, P> {
    pub fn new(
        source: TelemetrySource<G>,
        power: P,
        sink: Box<dyn StatusSink>,
        config: Config,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            source,
            power,
            sink,
            config,
            running,
        }
    }

    /// Run until quit, interrupt, or emergency poweroff. Returns the
    /// process exit code.
    pub fn run(&mut self) -> Result<i32> {
        if self.config.watch && self.config.quiet {
            log::info!("both watch and quiet are set, nothing to do");
            return Ok(0);
        }

        let interval = self.config.poll_interval();
        while self.running.load(Ordering::SeqCst) {
            let sample = self.source.sample()?;

            if guard::check(sample.voltage, self.config.min_voltage, self.config.watch)
                == GuardVerdict::Trigger
            {
                let message = guard::emergency_message(self.config.min_voltage);
                log::error!("{}", message);
                if let Err(e) = self.power.broadcast(&message) {
                    log::error!("terminal broadcast failed: {}", e);
                }
                self.power.poweroff()?;
                return Ok(0);
            }

            self.sink.render(&sample)?;
            match self.sink.wait(interval)? {
                WaitOutcome::Quit => return Ok(0),
                WaitOutcome::Elapsed => {}
            }
        }
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{REG_CHARGE, REG_VOLTAGE};
    use crate::error::UpsError;
    use crate::power::test_support::RecordingPower;
    use crate::telemetry::TelemetrySample;
    use crate::ui::NullSink;
    use std::sync::Mutex;

    /// Gauge yielding a fixed sequence of voltage registers.
    struct SequenceGauge {
        voltages: Vec<u16>,
        reads: Arc<Mutex<usize>>,
    }

    impl SequenceGauge {
        fn new(voltages: Vec<u16>) -> (Self, Arc<Mutex<usize>>) {
            let reads = Arc::new(Mutex::new(0));
            (
                Self {
                    voltages,
                    reads: reads.clone(),
                },
                reads,
            )
        }
    }

    impl BatteryGauge for SequenceGauge {
        fn read_register(&mut self, reg: u8) -> Result<u16> {
            match reg {
                REG_VOLTAGE => {
                    let mut reads = self.reads.lock().unwrap();
                    let raw = self
                        .voltages
                        .get(*reads)
                        .copied()
                        .ok_or_else(|| UpsError::Hardware("gauge read past end".into()))?;
                    *reads += 1;
                    Ok(raw)
                }
                REG_CHARGE => Ok(0x3C00), // 60 %
                other => panic!("unexpected register {other:#04x}"),
            }
        }
    }

    /// Sink that requests quit after a fixed number of rendered cycles.
    struct CountingSink {
        rendered: usize,
        quit_after: usize,
    }

    impl StatusSink for CountingSink {
        fn render(&mut self, _sample: &TelemetrySample) -> Result<()> {
            self.rendered += 1;
            Ok(())
        }

        fn wait(&mut self, _timeout: std::time::Duration) -> Result<WaitOutcome> {
            if self.rendered >= self.quit_after {
                Ok(WaitOutcome::Quit)
            } else {
                Ok(WaitOutcome::Elapsed)
            }
        }
    }

    fn monitor_with(
        voltages: Vec<u16>,
        sink: Box<dyn StatusSink>,
        config: Config,
    ) -> (Monitor<SequenceGauge, RecordingPower>, RecordingPower, Arc<Mutex<usize>>) {
        let (gauge, reads) = SequenceGauge::new(voltages);
        let source = TelemetrySource::with_temperature_path(gauge, "/nonexistent/thermal/temp");
        let power = RecordingPower::default();
        let recorder = power.clone();
        let running = Arc::new(AtomicBool::new(true));
        (
            Monitor::new(source, power, sink, config, running),
            recorder,
            reads,
        )
    }

    // Voltage register raws: volts * 12800
    const RAW_3V9: u16 = 49920;
    const RAW_3V6: u16 = 46080;
    const RAW_3V2: u16 = 40960;

    #[test]
    fn test_emergency_poweroff_on_third_cycle() {
        let config = Config {
            interval_secs: 0.005,
            min_voltage: 3.5,
            quiet: true,
            ..Default::default()
        };
        let running = Arc::new(AtomicBool::new(true));
        let (mut monitor, recorder, reads) = monitor_with(
            vec![RAW_3V9, RAW_3V6, RAW_3V2],
            Box::new(NullSink::new(running)),
            config,
        );

        let code = monitor.run().unwrap();
        assert_eq!(code, 0);
        // Broadcast first, then poweroff; never a fourth sample.
        assert_eq!(
            recorder.calls(),
            vec![
                "wall: [!] Battery voltage below threshold (3.5V). Emergency poweroff.",
                "poweroff"
            ]
        );
        assert_eq!(*reads.lock().unwrap(), 3);
    }

    #[test]
    fn test_watch_disables_the_guard() {
        let config = Config {
            interval_secs: 0.001,
            watch: true,
            ..Default::default()
        };
        let sink = Box::new(CountingSink {
            rendered: 0,
            quit_after: 2,
        });
        let (mut monitor, recorder, reads) =
            monitor_with(vec![RAW_3V2, RAW_3V2], sink, config);

        assert_eq!(monitor.run().unwrap(), 0);
        assert!(recorder.calls().is_empty());
        assert_eq!(*reads.lock().unwrap(), 2);
    }

    #[test]
    fn test_watch_and_quiet_is_a_noop() {
        let config = Config {
            watch: true,
            quiet: true,
            ..Default::default()
        };
        let running = Arc::new(AtomicBool::new(true));
        let (mut monitor, recorder, reads) =
            monitor_with(vec![RAW_3V2], Box::new(NullSink::new(running)), config);

        assert_eq!(monitor.run().unwrap(), 0);
        assert!(recorder.calls().is_empty());
        assert_eq!(*reads.lock().unwrap(), 0);
    }

    #[test]
    fn test_cleared_running_flag_exits_cleanly() {
        let (gauge, reads) = SequenceGauge::new(vec![RAW_3V9]);
        let source = TelemetrySource::with_temperature_path(gauge, "/nonexistent/thermal/temp");
        let power = RecordingPower::default();
        let recorder = power.clone();
        let running = Arc::new(AtomicBool::new(false));
        let sink = Box::new(NullSink::new(running.clone()));
        let mut monitor = Monitor::new(source, power, sink, Config::default(), running);

        assert_eq!(monitor.run().unwrap(), 0);
        assert!(recorder.calls().is_empty());
        assert_eq!(*reads.lock().unwrap(), 0);
    }

    #[test]
    fn test_quit_request_stops_after_first_cycle() {
        let config = Config {
            interval_secs: 0.001,
            ..Default::default()
        };
        let sink = Box::new(CountingSink {
            rendered: 0,
            quit_after: 1,
        });
        let (mut monitor, recorder, reads) = monitor_with(vec![RAW_3V9], sink, config);

        assert_eq!(monitor.run().unwrap(), 0);
        assert!(recorder.calls().is_empty());
        assert_eq!(*reads.lock().unwrap(), 1);
    }
}
