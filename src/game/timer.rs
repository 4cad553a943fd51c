//! Decision windows and their deadline timer

use crate::config::DelayProfile;
use crate::core::Seat;
use crate::game::cancel::CancellationScope;
use crate::game::offer::{Choice, Offer};
use crate::{Result, TableError};
use std::time::Duration;
use tokio::time::Instant;

/// Deadline for the currently open window
///
/// Arming always disarms first, so a deadline from an earlier window can
/// never fire into a later one.
#[derive(Debug, Clone)]
pub struct DecisionTimer {
    delay: Option<Duration>,
    deadline: Option<Instant>,
    fired: bool,
}

impl DecisionTimer {
    pub fn new(profile: DelayProfile) -> Self {
        DecisionTimer {
            delay: profile.delay(),
            deadline: None,
            fired: false,
        }
    }

    /// Takes effect at the next `arm()`
    pub fn set_profile(&mut self, profile: DelayProfile) {
        self.delay = profile.delay();
    }

    /// Start a deadline from now; `None` when the profile is disabled
    pub fn arm(&mut self) -> Option<Instant> {
        self.disarm();
        self.fired = false;
        self.deadline = self.delay.map(|delay| Instant::now() + delay);
        self.deadline
    }

    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn delay(&self) -> Option<Duration> {
        self.delay
    }

    /// Completes at the deadline; never completes while disarmed
    pub async fn expired(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }

    /// Claim the expiry
    ///
    /// True at most once per arming, and never after cancellation.
    pub fn fire(&mut self, scope: &CancellationScope) -> bool {
        if self.deadline.is_none() || self.fired || scope.is_cancelled() {
            return false;
        }
        self.fired = true;
        self.deadline = None;
        true
    }
}

/// An open decision for one seat
#[derive(Debug, Clone)]
pub struct DecisionWindow {
    pub id: u64,
    pub seat: Seat,
    pub offer: Offer,
    /// Bound default action, fired on expiry
    pub default: Choice,
    pub deadline: Option<Instant>,
}

/// Admits at most one open window
#[derive(Debug, Default)]
pub struct WindowGate {
    open: Option<(u64, Seat)>,
    next_id: u64,
}

impl WindowGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a window for `seat`; fails while another window is open
    pub fn open(&mut self, seat: Seat) -> Result<u64> {
        if let Some((_, holder)) = self.open {
            return Err(TableError::WindowAlreadyOpen(holder));
        }
        self.next_id += 1;
        self.open = Some((self.next_id, seat));
        Ok(self.next_id)
    }

    /// Close window `id`; false if it was not the open one
    pub fn close(&mut self, id: u64) -> bool {
        match self.open {
            Some((open_id, _)) if open_id == id => {
                self.open = None;
                true
            }
            _ => false,
        }
    }
}
