use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Minutes assumed when the requested duration cannot be read
pub const DEFAULT_MINUTES: u32 = 5;

// "5 minutes", "5-6 minutes", "10 min", "1 hour", "2 hrs"
static DURATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)(?:\s*-\s*(\d+))?\s*(minutes?|mins?|hours?|hrs?)\b")
        .expect("duration pattern is valid")
});

/// Per-action cost settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostSchedule {
    pub base_cost: i64,
    pub long_form_multiplier: i64,
    pub long_form_threshold_minutes: u32,
}

impl Default for CostSchedule {
    fn default() -> Self {
        Self {
            base_cost: 20,
            long_form_multiplier: 2,
            long_form_threshold_minutes: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Quote {
    pub cost: i64,
    pub minutes: u32,
    pub long_form: bool,
}

impl CostSchedule {
    pub fn quote(&self, usetime: &str) -> Quote {
        let minutes = parse_minutes(usetime);
        let long_form = minutes > self.long_form_threshold_minutes;
        let cost = if long_form {
            self.base_cost.saturating_mul(self.long_form_multiplier)
        } else {
            self.base_cost
        };

        Quote {
            cost,
            minutes,
            long_form,
        }
    }
}

/// Requested duration in minutes; ranges count at their upper bound
pub fn parse_minutes(usetime: &str) -> u32 {
    let Some(captures) = DURATION_PATTERN.captures(usetime) else {
        return DEFAULT_MINUTES;
    };

    let amount = captures
        .get(2)
        .or_else(|| captures.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok());

    let Some(amount) = amount else {
        return DEFAULT_MINUTES;
    };

    let unit = captures.get(3).map(|m| m.as_str().to_lowercase()).unwrap_or_default();
    if unit.starts_with('h') {
        amount.saturating_mul(60)
    } else {
        amount
    }
}
