use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::SiteConfig;

/// Document-level activity the detector counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interaction {
    MouseMove,
    KeyDown,
    Click,
    Scroll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BotReason {
    SubmissionTooFast,
    NoHumanInteraction,
}

impl BotReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BotReason::SubmissionTooFast => "submission_too_fast",
            BotReason::NoHumanInteraction => "no_human_interaction",
        }
    }
}

impl fmt::Display for BotReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotVerdict {
    Human,
    Bot(BotReason),
}

impl BotVerdict {
    pub fn is_bot(&self) -> bool {
        matches!(self, BotVerdict::Bot(_))
    }
}

/// Values of the two decoy inputs hidden from people
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoneypotFields {
    pub honeypot: String,
    pub fax_number: String,
}

/// Interaction counters used to guess whether a person is at the keyboard.
///
/// A heuristic against naive fill-and-submit scripts only.
#[derive(Debug, Clone)]
pub struct BotDetector {
    started_at: u64,
    min_time_on_page_ms: u64,
    min_interactions: u32,
    mouse_movements: u32,
    keystrokes: u32,
    interactions: u32,
}

impl BotDetector {
    pub fn new(config: &SiteConfig, started_at: u64) -> Self {
        BotDetector {
            started_at,
            min_time_on_page_ms: config.min_time_on_page_ms,
            min_interactions: config.min_interactions,
            mouse_movements: 0,
            keystrokes: 0,
            interactions: 0,
        }
    }

    pub fn record(&mut self, interaction: Interaction) {
        let counter = match interaction {
            Interaction::MouseMove => &mut self.mouse_movements,
            Interaction::KeyDown => &mut self.keystrokes,
            Interaction::Click | Interaction::Scroll => &mut self.interactions,
        };
        *counter = counter.saturating_add(1);
    }

    pub fn is_likely_bot(&self, now: u64) -> BotVerdict {
        let time_on_page = now.saturating_sub(self.started_at);
        if time_on_page < self.min_time_on_page_ms {
            return BotVerdict::Bot(BotReason::SubmissionTooFast);
        }

        if self.mouse_movements == 0
            && self.keystrokes == 0
            && self.interactions < self.min_interactions
        {
            return BotVerdict::Bot(BotReason::NoHumanInteraction);
        }

        BotVerdict::Human
    }

    /// True when either decoy field carries a value
    pub fn check_honeypot(fields: &HoneypotFields) -> bool {
        !fields.honeypot.is_empty() || !fields.fax_number.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> BotDetector {
        BotDetector::new(&SiteConfig::default(), 0)
    }

    #[test]
    fn too_fast_wins_over_everything() {
        let mut bot = detector();
        bot.record(Interaction::MouseMove);
        bot.record(Interaction::KeyDown);
        assert_eq!(
            bot.is_likely_bot(1_000),
            BotVerdict::Bot(BotReason::SubmissionTooFast)
        );
    }

    #[test]
    fn idle_page_looks_automated() {
        let bot = detector();
        assert_eq!(
            bot.is_likely_bot(3_000),
            BotVerdict::Bot(BotReason::NoHumanInteraction)
        );
    }

    #[test]
    fn mouse_and_key_activity_passes() {
        let mut bot = detector();
        bot.record(Interaction::MouseMove);
        bot.record(Interaction::KeyDown);
        assert_eq!(bot.is_likely_bot(3_000), BotVerdict::Human);
    }

    #[test]
    fn two_clicks_are_enough_without_mouse_or_keys() {
        let mut bot = detector();
        bot.record(Interaction::Click);
        assert!(bot.is_likely_bot(5_000).is_bot());
        bot.record(Interaction::Scroll);
        assert!(!bot.is_likely_bot(5_000).is_bot());
    }

    #[test]
    fn honeypot_trips_on_either_field() {
        assert!(!BotDetector::check_honeypot(&HoneypotFields::default()));
        assert!(BotDetector::check_honeypot(&HoneypotFields {
            honeypot: "x".into(),
            ..HoneypotFields::default()
        }));
        assert!(BotDetector::check_honeypot(&HoneypotFields {
            fax_number: "555".into(),
            ..HoneypotFields::default()
        }));
    }

    #[test]
    fn reason_strings() {
        assert_eq!(BotReason::SubmissionTooFast.to_string(), "submission_too_fast");
        assert_eq!(BotReason::NoHumanInteraction.as_str(), "no_human_interaction");
    }
}
