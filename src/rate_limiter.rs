use log::warn;
use std::collections::VecDeque;
use std::fmt;

use crate::config::SiteConfig;

/// Timestamps of accepted events inside a fixed trailing window
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    window_ms: u64,
    ceiling: usize,
    events: VecDeque<u64>,
}

impl SlidingWindow {
    pub fn new(window_ms: u64, ceiling: usize) -> Self {
        SlidingWindow {
            window_ms,
            ceiling,
            events: VecDeque::new(),
        }
    }

    /// Drop events that have aged out of the window
    fn prune(&mut self, now: u64) {
        while let Some(&oldest) = self.events.front() {
            if now.saturating_sub(oldest) < self.window_ms {
                break;
            }
            self.events.pop_front();
        }
    }

    pub fn has_capacity(&mut self, now: u64) -> bool {
        self.prune(now);
        self.events.len() < self.ceiling
    }

    pub fn record(&mut self, now: u64) {
        self.events.push_back(now);
    }

    /// Prune, then record and accept if under the ceiling
    pub fn try_acquire(&mut self, now: u64) -> bool {
        if !self.has_capacity(now) {
            return false;
        }
        self.record(now);
        true
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Why a form submission was turned away
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormLimit {
    /// Still inside the cooldown after the last accepted submission
    Cooldown { wait_secs: u64 },
    /// Too many accepted submissions inside the form window
    TooMany,
}

impl fmt::Display for FormLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormLimit::Cooldown { wait_secs } => write!(
                f,
                "Please wait {} seconds before submitting again",
                wait_secs
            ),
            FormLimit::TooMany => f.write_str("Too many submissions. Please try again later."),
        }
    }
}

/// Per-page request and form-submission throttling
#[derive(Debug, Clone)]
pub struct RateLimiter {
    requests: SlidingWindow,
    form_submissions: SlidingWindow,
    form_cooldown_ms: u64,
    last_form_submit: Option<u64>,
}

impl RateLimiter {
    pub fn new(config: &SiteConfig) -> Self {
        RateLimiter {
            requests: SlidingWindow::new(config.rate_limit_window_ms, config.max_requests_per_window),
            form_submissions: SlidingWindow::new(config.form_window_ms(), config.max_form_submissions),
            form_cooldown_ms: config.form_cooldown_ms,
            last_form_submit: None,
        }
    }

    /// General request budget; records the request when it is allowed
    pub fn check_limit(&mut self, now: u64) -> bool {
        if self.requests.try_acquire(now) {
            return true;
        }
        warn!("Rate limit exceeded");
        false
    }

    /// Form budget: cooldown first, then the form window
    pub fn check_form_limit(&mut self, now: u64) -> Result<(), FormLimit> {
        if let Some(last) = self.last_form_submit {
            let elapsed = now.saturating_sub(last);
            if elapsed < self.form_cooldown_ms {
                let remaining = self.form_cooldown_ms - elapsed;
                return Err(FormLimit::Cooldown {
                    wait_secs: remaining.div_ceil(1000),
                });
            }
        }

        if !self.form_submissions.try_acquire(now) {
            return Err(FormLimit::TooMany);
        }
        self.last_form_submit = Some(now);
        Ok(())
    }
}
