use lazy_static::lazy_static;
use regex::Regex;

use super::Intent;

/// Builds a case-insensitive whole-word alternation for a keyword list.
/// Whole-word matching is a deliberate divergence from the reference
/// behavior, which used raw substring containment and let "hod" fire
/// inside "handoff".
fn keyword_pattern(words: &[&str]) -> Regex {
    let escaped: Vec<String> = words
        .iter()
        .map(|w| regex::escape(w).replace(' ', r"\s+"))
        .collect();
    Regex::new(&format!(r"(?i)\b(?:{})\b", escaped.join("|")))
        .unwrap_or_else(|e| panic!("invalid intent keyword pattern: {e}"))
}

lazy_static! {
    /// Exact salutation word, optionally followed by "there/everyone/all"
    /// and trailing punctuation. Anchored so "hi" greets but "which
    /// historian teaches history" does not.
    pub(super) static ref GREETING_PATTERNS: Vec<Regex> = vec![
        Regex::new(
            r"(?i)^\s*(hi+|hello+|hey+|heya|howdy|hola|namaste|greetings|good\s+(morning|afternoon|evening|day))([\s,!.?]+(there|everyone|all))?[\s!.?,]*$"
        )
        .unwrap_or_else(|e| panic!("invalid greeting pattern: {e}")),
    ];

    /// Ordered priority chain, evaluated top to bottom, first match wins.
    /// Reordering changes observable behavior; the order is pinned by tests.
    pub(super) static ref INTENT_RULES: Vec<(Intent, Regex)> = vec![
        (
            Intent::FeesInfo,
            keyword_pattern(&[
                "fee", "fees", "tuition", "scholarship", "scholarships", "payment", "fine",
                "fines", "cost", "price", "charges", "installment",
            ]),
        ),
        (
            Intent::StaffInfo,
            Regex::new(&format!(
                "{}|{}",
                keyword_pattern(&[
                    "staff", "faculty", "professor", "professors", "teacher", "teachers",
                    "lecturer", "lecturers", "instructor", "hod", "hods", "dean", "principal",
                    "warden", "department", "departments", "cse", "ece", "eee", "mech", "civil",
                ])
                .as_str(),
                // Short branch abbreviations only count next to a department
                // word; bare "me"/"it" are everyday English.
                r"(?i)\b(?:me|ee|ce|cs|it)\s+(?:department|dept|branch|faculty|staff|hod)\b|(?i)\b(?:department|dept|branch)\s+of\s+(?:me|ee|ce|cs|it)\b",
            ))
            .unwrap_or_else(|e| panic!("invalid staff pattern: {e}")),
        ),
        (
            Intent::Directions,
            keyword_pattern(&[
                "where", "location", "located", "direction", "directions", "route", "map",
                "navigate", "reach", "room", "building", "block", "floor", "hall", "lab",
            ]),
        ),
        (
            Intent::EventsInfo,
            keyword_pattern(&[
                "event", "events", "fest", "festival", "seminar", "workshop", "celebration",
                "competition", "hackathon",
            ]),
        ),
        (
            Intent::AdmissionInfo,
            keyword_pattern(&[
                "admission", "admissions", "apply", "application", "enroll", "enrollment",
                "eligibility", "entrance", "intake",
            ]),
        ),
        (
            Intent::TimetableInfo,
            keyword_pattern(&[
                "timetable", "schedule", "timing", "timings", "period", "periods", "slot",
            ]),
        ),
        (
            Intent::ExamInfo,
            keyword_pattern(&[
                "exam", "exams", "examination", "test", "tests", "result", "results", "marks",
                "grade", "grades", "assessment", "revaluation",
            ]),
        ),
    ];
}
