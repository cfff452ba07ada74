//! Rule-based intent classification. A fixed priority chain of keyword
//! rules, greeting patterns first; unmatched utterances fall through to
//! [`Intent::GeneralInfo`].

mod rules;

use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::debug;

/// Coarse category of user need inferred from one utterance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    Greeting,
    FeesInfo,
    StaffInfo,
    Directions,
    EventsInfo,
    AdmissionInfo,
    TimetableInfo,
    ExamInfo,
    #[default]
    GeneralInfo,
}

/// Classifies an utterance. Rules run in a fixed priority order, first
/// match wins; there is no error path.
pub fn classify(utterance: &str) -> Intent {
    let trimmed = utterance.trim();
    if trimmed.is_empty() {
        return Intent::GeneralInfo;
    }

    if rules::GREETING_PATTERNS.iter().any(|re| re.is_match(trimmed)) {
        return Intent::Greeting;
    }

    for (intent, pattern) in rules::INTENT_RULES.iter() {
        if pattern.is_match(trimmed) {
            debug!("Classified '{}' as {}", crate::safe_truncate(trimmed, 40), intent);
            return *intent;
        }
    }

    Intent::GeneralInfo
}
