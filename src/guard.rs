//! Battery voltage guard
//!
//! Evaluated once per poll cycle, before any display update, so an emergency
//! shutdown is never delayed behind a UI refresh.

/// Outcome of a voltage guard evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardVerdict {
    /// Voltage acceptable, continue monitoring.
    Ok,
    /// Voltage below the threshold, emergency poweroff required.
    Trigger,
}

/// Evaluate the guard for one sampled voltage.
///
/// Fires exactly when watch-only is disabled and `voltage < min_voltage`;
/// a voltage equal to the threshold does not trigger. The condition is kept
/// as a single guarded trigger and is never decomposed.
pub fn check(voltage: f64, min_voltage: f64, watch_only: bool) -> GuardVerdict {
    if !watch_only && voltage < min_voltage {
        GuardVerdict::Trigger
    } else {
        GuardVerdict::Ok
    }
}

/// Message broadcast to all logged-in terminals before powering off.
pub fn emergency_message(min_voltage: f64) -> String {
    format!(
        "[!] Battery voltage below threshold ({:.1}V). Emergency poweroff.",
        min_voltage
    )
}
