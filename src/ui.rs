//! Presentation sinks
//!
//! The monitor loop hands each [`TelemetrySample`] to a [`StatusSink`] and
//! never depends on a concrete UI. Three implementations exist: the ratatui
//! terminal dashboard (`--ncurses`), plain line-oriented output, and a
//! no-op sink for quiet mode. All waits are bounded and tick every 100 ms
//! so an interrupt is noticed promptly.

use crate::error::Result;
use crate::telemetry::TelemetrySample;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const WAIT_TICK: Duration = Duration::from_millis(100);

/// How a bounded wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The interval elapsed (or the running flag was cleared).
    Elapsed,
    /// The user asked to quit.
    Quit,
}

/// Renders telemetry snapshots and waits between polls.
pub trait StatusSink {
    /// Render one snapshot.
    fn render(&mut self, sample: &TelemetrySample) -> Result<()>;

    /// Wait up to `timeout` for the next cycle or an interactive quit.
    fn wait(&mut self, timeout: Duration) -> Result<WaitOutcome>;
}

fn timestamp_label(sample: &TelemetrySample) -> String {
    sample.timestamp.format("%d/%m/%Y - %H:%M:%S").to_string()
}

/// Telemetry rows shared by the plain and dashboard sinks. The temperature
/// row is omitted when the sensor is unavailable.
fn status_lines(sample: &TelemetrySample) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(temperature) = sample.temperature_c {
        lines.push(format!("CPU Temperature: {}°C", temperature));
    }
    lines.push(format!("Voltage: {:5.2}V", sample.voltage));
    lines.push(format!("Battery: {:5.0}%", sample.charge_percent));
    lines
}

fn interval_label(secs: f64) -> String {
    let value = if secs.fract() == 0.0 {
        format!("{}", secs as u64)
    } else {
        format!("{:.1}", secs)
    };
    let plural = if (secs - 1.0).abs() < f64::EPSILON { "" } else { "s" };
    format!("Refreshing every {} second{}.", value, plural)
}

fn sleep_responsive(timeout: Duration, running: &AtomicBool) {
    let deadline = Instant::now() + timeout;
    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        std::thread::sleep((deadline - now).min(WAIT_TICK));
    }
}

/// Line-oriented stdout sink.
pub struct PlainSink {
    running: Arc<AtomicBool>,
}

impl PlainSink {
    pub fn new(running: Arc<AtomicBool>) -> Self {
        Self { running }
    }
}

impl StatusSink for PlainSink {
    fn render(&mut self, sample: &TelemetrySample) -> Result<()> {
        println!(" ---- {} ----", timestamp_label(sample));
        for line in status_lines(sample) {
            println!("{}", line);
        }
        println!();
        Ok(())
    }

    fn wait(&mut self, timeout: Duration) -> Result<WaitOutcome> {
        sleep_responsive(timeout, &self.running);
        Ok(WaitOutcome::Elapsed)
    }
}

/// Quiet-mode sink: renders nothing, only sleeps.
pub struct NullSink {
    running: Arc<AtomicBool>,
}

impl NullSink {
    pub fn new(running: Arc<AtomicBool>) -> Self {
        Self { running }
    }
}

impl StatusSink for NullSink {
    fn render(&mut self, _sample: &TelemetrySample) -> Result<()> {
        Ok(())
    }

    fn wait(&mut self, timeout: Duration) -> Result<WaitOutcome> {
        sleep_responsive(timeout, &self.running);
        Ok(WaitOutcome::Elapsed)
    }
}

#[cfg(feature = "tui")]
pub use dashboard::TuiSink;

#[cfg(feature = "tui")]
mod dashboard {
    use super::*;
    use crossterm::event::{self, Event, KeyCode, KeyEventKind};
    use crossterm::execute;
    use crossterm::terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
    };
    use ratatui::backend::CrosstermBackend;
    use ratatui::style::{Modifier, Style};
    use ratatui::text::{Line, Span};
    use ratatui::widgets::{Block, Borders, Paragraph};
    use ratatui::Terminal;
    use std::io::{self, Stdout};

    /// Terminal dashboard sink.
    ///
    /// Raw mode and the alternate screen are restored on drop, on every
    /// exit path.
    pub struct TuiSink {
        terminal: Terminal<CrosstermBackend<Stdout>>,
        interval_secs: f64,
        running: Arc<AtomicBool>,
    }

    impl TuiSink {
        pub fn new(interval_secs: f64, running: Arc<AtomicBool>) -> Result<Self> {
            enable_raw_mode()?;
            let mut stdout = io::stdout();
            execute!(stdout, EnterAlternateScreen)?;
            let backend = CrosstermBackend::new(stdout);
            let terminal = Terminal::new(backend)?;
            Ok(Self {
                terminal,
                interval_secs,
                running,
            })
        }
    }

    impl StatusSink for TuiSink {
        fn render(&mut self, sample: &TelemetrySample) -> Result<()> {
            let mut lines = vec![
                Line::from(Span::styled(
                    "upsmon",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(interval_label(self.interval_secs)),
                Line::from("Press q to exit"),
                Line::from(""),
                Line::from(format!("---- {} ----", timestamp_label(sample))),
            ];
            for text in status_lines(sample) {
                lines.push(Line::from(text));
            }
            self.terminal.draw(|frame| {
                let block = Block::default().borders(Borders::ALL);
                let area = frame.area();
                frame.render_widget(Paragraph::new(lines).block(block), area);
            })?;
            Ok(())
        }

        fn wait(&mut self, timeout: Duration) -> Result<WaitOutcome> {
            let deadline = Instant::now() + timeout;
            while self.running.load(Ordering::SeqCst) {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                if event::poll((deadline - now).min(WAIT_TICK))? {
                    if let Event::Key(key) = event::read()? {
                        if key.kind == KeyEventKind::Press
                            && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
                        {
                            return Ok(WaitOutcome::Quit);
                        }
                    }
                }
            }
            Ok(WaitOutcome::Elapsed)
        }
    }

    impl Drop for TuiSink {
        fn drop(&mut self) {
            let _ = disable_raw_mode();
            let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
            let _ = self.terminal.show_cursor();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    fn sample(temperature_c: Option<i64>) -> TelemetrySample {
        TelemetrySample {
            temperature_c,
            voltage: 3.9,
            charge_percent: 76.0,
            timestamp: Local::now(),
        }
    }

    #[test]
    fn test_status_lines_with_temperature() {
        let lines = status_lines(&sample(Some(47)));
        assert_eq!(
            lines,
            vec!["CPU Temperature: 47°C", "Voltage:  3.90V", "Battery:    76%"]
        );
    }

    #[test]
    fn test_status_lines_without_temperature() {
        let lines = status_lines(&sample(None));
        assert_eq!(lines, vec!["Voltage:  3.90V", "Battery:    76%"]);
    }

    #[test]
    fn test_interval_label() {
        assert_eq!(interval_label(2.0), "Refreshing every 2 seconds.");
        assert_eq!(interval_label(1.0), "Refreshing every 1 second.");
        assert_eq!(interval_label(0.5), "Refreshing every 0.5 seconds.");
    }

    #[test]
    fn test_timestamp_label_shape() {
        let label = timestamp_label(&sample(None));
        // dd/mm/yyyy - hh:mm:ss
        assert_eq!(label.len(), 21);
        assert!(label.contains(" - "));
    }

    #[test]
    fn test_sleep_responsive_honours_cleared_flag() {
        let running = AtomicBool::new(false);
        let start = Instant::now();
        sleep_responsive(Duration::from_secs(5), &running);
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
