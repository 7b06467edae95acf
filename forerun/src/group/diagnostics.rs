use std::{fmt, time::Duration};

/// A phase of a composed handler's execution, reported when logging is enabled
/// on the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event<'a> {
    UnitsStarted {
        group: &'a str,
        units: usize,
    },
    UnitStarted {
        group: &'a str,
        index: usize,
    },
    UnitCompleted {
        group: &'a str,
        index: usize,
        elapsed: Duration,
    },
    UnitsCompleted {
        group: &'a str,
        elapsed: Duration,
    },
    MainStarted {
        group: &'a str,
    },
    ChainCompleted {
        group: &'a str,
        elapsed: Duration,
    },
}

impl<'a> Event<'a> {
    pub fn group(&self) -> &'a str {
        match *self {
            Event::UnitsStarted { group, .. }
            | Event::UnitStarted { group, .. }
            | Event::UnitCompleted { group, .. }
            | Event::UnitsCompleted { group, .. }
            | Event::MainStarted { group }
            | Event::ChainCompleted { group, .. } => group,
        }
    }
}

impl fmt::Display for Event<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::UnitsStarted { group, units } => {
                write!(f, "[{group}] started running {units} unit(s)")
            }
            Event::UnitStarted { group, index } => write!(f, "[{group}] running unit #{index}"),
            Event::UnitCompleted {
                group,
                index,
                elapsed,
            } => write!(f, "[{group}] unit #{index} completed in {elapsed:?}"),
            Event::UnitsCompleted { group, elapsed } => {
                write!(f, "[{group}] all units completed. elapsed: {elapsed:?}")
            }
            Event::MainStarted { group } => write!(f, "[{group}] running main handler"),
            Event::ChainCompleted { group, elapsed } => {
                write!(f, "[{group}] units + handler completed in {elapsed:?}")
            }
        }
    }
}

/// Destination for the diagnostics of logging-enabled groups.
///
/// Implementations must not block the caller for long and must swallow their
/// own write failures.
pub trait Diagnostics: Send + Sync + 'static {
    fn record(&self, event: &Event<'_>);
}

impl<F> Diagnostics for F
where
    F: Fn(&Event<'_>) + Send + Sync + 'static,
{
    fn record(&self, event: &Event<'_>) {
        self(event)
    }
}

/// Emits every event through `tracing` at the `INFO` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn record(&self, event: &Event<'_>) {
        match *event {
            Event::UnitsStarted { group, units } => {
                tracing::info!(group, units, "{event}")
            }
            Event::UnitStarted { group, index } => {
                tracing::info!(group, index, "{event}")
            }
            Event::UnitCompleted {
                group,
                index,
                elapsed,
            } => {
                tracing::info!(group, index, elapsed = ?elapsed, "{event}")
            }
            Event::UnitsCompleted { group, elapsed } => {
                tracing::info!(group, elapsed = ?elapsed, "{event}")
            }
            Event::MainStarted { group } => {
                tracing::info!(group, "{event}")
            }
            Event::ChainCompleted { group, elapsed } => {
                tracing::info!(group, elapsed = ?elapsed, "{event}")
            }
        }
    }
}
