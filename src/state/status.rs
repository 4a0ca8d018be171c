//! Status Module - externally reported system status
//!
//! Busy, communicating and error statuses override focus-based flow profile
//! selection. The generative-content client (outside this crate) reports
//! status here; the host reads it once per frame.

use spark_signals::{signal, Signal};

use crate::flow::SystemStatus;

thread_local! {
    static SYSTEM_STATUS: Signal<SystemStatus> = signal(SystemStatus::Idle);
}

/// Get the current system status.
pub fn system_status() -> SystemStatus {
    SYSTEM_STATUS.with(|s| s.get())
}

/// Report a new system status.
pub fn set_system_status(status: SystemStatus) {
    SYSTEM_STATUS.with(|s| {
        if s.get() != status {
            tracing::debug!(?status, "system status changed");
            s.set(status);
        }
    });
}

/// Advance to the next status (host debug toggle). Returns the new status.
pub fn cycle_system_status() -> SystemStatus {
    let next = system_status().cycle();
    set_system_status(next);
    next
}

/// Reset status to idle (for testing).
pub fn reset_status_state() {
    SYSTEM_STATUS.with(|s| s.set(SystemStatus::Idle));
}
