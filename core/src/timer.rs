use core::time::Duration;
use std::collections::BTreeMap;

/// Identifies one session lifetime; bumped on every restart.
pub type Generation = u64;

/// Countdown wake-up period.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(pub u64);

/// Periodic wake-up facility provided by the host.
///
/// Every wake-up must be forwarded to
/// [`GameSession::tick`](crate::GameSession::tick) with the generation it was
/// scheduled for.
pub trait Scheduler {
    fn schedule_repeating(&mut self, interval: Duration, generation: Generation) -> TimerHandle;
    fn cancel(&mut self, handle: TimerHandle);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ScheduledTimer {
    pub interval: Duration,
    pub generation: Generation,
}

/// Scheduler that only records requests, the host fires ticks by hand.
#[derive(Clone, Debug, Default)]
pub struct ManualScheduler {
    active: BTreeMap<TimerHandle, ScheduledTimer>,
    next_id: u64,
    cancelled: Vec<TimerHandle>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, handle: TimerHandle) -> bool {
        self.active.contains_key(&handle)
    }

    pub fn active(&self) -> impl Iterator<Item = (TimerHandle, ScheduledTimer)> + '_ {
        self.active.iter().map(|(&handle, &timer)| (handle, timer))
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn cancelled(&self) -> &[TimerHandle] {
        &self.cancelled
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_repeating(&mut self, interval: Duration, generation: Generation) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.active.insert(
            handle,
            ScheduledTimer {
                interval,
                generation,
            },
        );
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if self.active.remove(&handle).is_some() {
            self.cancelled.push(handle);
        }
    }
}

/// Countdown state of one session.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Countdown {
    Off,
    /// Configured but waiting for the first move.
    Idle { limit: u32 },
    Running { remaining: u32, handle: TimerHandle },
    Stopped { remaining: u32 },
}

impl Countdown {
    pub fn new(limit: Option<u32>) -> Self {
        match limit {
            Some(limit) if limit > 0 => Self::Idle { limit },
            _ => Self::Off,
        }
    }

    /// Seconds left, `None` when the timer is off.
    pub const fn remaining(self) -> Option<u32> {
        match self {
            Self::Off => None,
            Self::Idle { limit } => Some(limit),
            Self::Running { remaining, .. } | Self::Stopped { remaining } => Some(remaining),
        }
    }

    pub const fn handle(self) -> Option<TimerHandle> {
        match self {
            Self::Running { handle, .. } => Some(handle),
            _ => None,
        }
    }

    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running { .. })
    }
}
