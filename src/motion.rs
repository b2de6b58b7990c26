//! The caller-side motion loop: step the drive out to a limit and back,
//! forever or for a fixed number of cycles, returning to origin when asked
//! to stop.

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use log::{info, warn};

use crate::error::ErrorCode;
use crate::servo::{MoveOutcome, ServoDrive};
use crate::transport::Transport;

/// A flag shared between the motion loop and whoever wants it to stop
/// (typically a Ctrl-C handler).
#[derive(Clone, Default)]
pub struct CancellationToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (flag, cvar) = &*self.inner;
        *flag.lock().unwrap_or_else(|e| e.into_inner()) = true;
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Sleeps for `duration` or until cancelled. Returns whether the token
    /// is cancelled.
    pub fn sleep(&self, duration: Duration) -> bool {
        let (flag, cvar) = &*self.inner;
        let guard = flag.lock().unwrap_or_else(|e| e.into_inner());
        let (guard, _) = cvar
            .wait_timeout_while(guard, duration, |cancelled| !*cancelled)
            .unwrap_or_else(|e| e.into_inner());
        *guard
    }
}

/// Accelerations, targets and pauses of one motion cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotionProfile {
    pub origin: i32,
    pub step: i32,
    pub limit: i32,
    /// Used while stepping out to `limit`.
    pub slow_acceleration: u32,
    /// Used for the single move back to `origin`.
    pub fast_acceleration: u32,
    /// Pause after every reached step.
    pub dwell: Duration,
    /// Pause after returning to origin.
    pub return_dwell: Duration,
}

impl Default for MotionProfile {
    fn default() -> Self {
        MotionProfile {
            origin: 0,
            step: 500_000,
            limit: 3_000_000,
            slow_acceleration: 1_000,
            fast_acceleration: 20_000,
            dwell: Duration::from_secs(1),
            return_dwell: Duration::from_secs(2),
        }
    }
}

impl MotionProfile {
    /// Targets visited on the way out, in order.
    pub fn steps(&self) -> Vec<i32> {
        let mut targets = Vec::new();
        if self.step <= 0 {
            return targets;
        }
        let mut target = self.origin;
        while target < self.limit {
            target = target.saturating_add(self.step);
            targets.push(target);
        }
        targets
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionOutcome {
    /// All requested cycles ran to the end.
    Completed { cycles: u32 },
    /// Stopped by the token; the drive was brought back to origin.
    Cancelled { cycles: u32, position: i32 },
}

pub struct MotionSequencer<T: Transport> {
    drive: ServoDrive<T>,
    profile: MotionProfile,
    max_cycles: Option<u32>,
}

impl<T: Transport> MotionSequencer<T> {
    pub fn new(drive: ServoDrive<T>, profile: MotionProfile) -> Self {
        MotionSequencer { drive, profile, max_cycles: None }
    }

    /// Stop after `cycles` full cycles instead of running until cancelled.
    pub fn with_max_cycles(mut self, cycles: u32) -> Self {
        self.max_cycles = Some(cycles);
        self
    }

    pub fn drive(&self) -> &ServoDrive<T> {
        &self.drive
    }

    pub fn into_drive(self) -> ServoDrive<T> {
        self.drive
    }

    pub fn run(&mut self, cancel: &CancellationToken) -> Result<MotionOutcome, ErrorCode> {
        self.drive.prepare()?;
        let mut cycles = 0u32;
        loop {
            if self.max_cycles.map_or(false, |max| cycles >= max) {
                return Ok(MotionOutcome::Completed { cycles });
            }
            if !self.run_cycle(cancel)? {
                warn!("[servo] cancellation accepted, moving to the origin");
                let position = self.drive.drive_to(self.profile.origin)?;
                return Ok(MotionOutcome::Cancelled { cycles, position });
            }
            cycles += 1;
        }
    }

    /// Returns false when cancelled part way.
    fn run_cycle(&mut self, cancel: &CancellationToken) -> Result<bool, ErrorCode> {
        self.drive.set_acceleration(self.profile.slow_acceleration)?;
        for target in self.profile.steps() {
            info!("[servo] stepping to {}", target);
            if self.drive.move_to(target, cancel)? == MoveOutcome::Cancelled {
                return Ok(false);
            }
            if cancel.sleep(self.profile.dwell) {
                return Ok(false);
            }
        }

        self.drive.set_acceleration(self.profile.fast_acceleration)?;
        info!("[servo] returning to {}", self.profile.origin);
        if self.drive.move_to(self.profile.origin, cancel)? == MoveOutcome::Cancelled {
            return Ok(false);
        }
        Ok(!cancel.sleep(self.profile.return_dwell))
    }
}
