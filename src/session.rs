use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("a session needs at least one phase")]
    EmptyPhases,

    #[error("phase {key:?} must last at least one minute")]
    NonPositiveDuration { key: String },

    #[error("phase {key:?} may last at most {max} minutes")]
    DurationTooLong { key: String, max: u32 },

    #[error("phase key {0:?} is used more than once")]
    DuplicatePhaseKey(String),

    #[error("no phase with key {0:?}")]
    UnknownPhase(String),
}

/// Longest phase a timer accepts: one day.
pub const MAX_PHASE_MINUTES: u32 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPhase {
    pub key: String,
    pub label: String,
    pub minutes: u32,
}

impl SessionPhase {
    pub fn new(key: impl Into<String>, label: impl Into<String>, minutes: u32) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            minutes,
        }
    }

    pub fn duration_secs(&self) -> u32 {
        self.minutes.saturating_mul(60)
    }
}

/// Checks a single phase duration against `1..=MAX_PHASE_MINUTES`.
pub fn validate_minutes(key: &str, minutes: u32) -> Result<(), SessionError> {
    if minutes == 0 {
        return Err(SessionError::NonPositiveDuration {
            key: key.to_string(),
        });
    }
    if minutes > MAX_PHASE_MINUTES {
        return Err(SessionError::DurationTooLong {
            key: key.to_string(),
            max: MAX_PHASE_MINUTES,
        });
    }
    Ok(())
}

/// Checks the invariants every phase list must hold before a timer is
/// built around it.
pub fn validate_phases(phases: &[SessionPhase]) -> Result<(), SessionError> {
    if phases.is_empty() {
        return Err(SessionError::EmptyPhases);
    }
    let mut seen = HashSet::new();
    for p in phases {
        validate_minutes(&p.key, p.minutes)?;
        if !seen.insert(p.key.as_str()) {
            return Err(SessionError::DuplicatePhaseKey(p.key.clone()));
        }
    }
    Ok(())
}

/// Rotating prompt text per phase key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTable {
    prompts: HashMap<String, Vec<String>>,
    fallback: Option<String>,
}

impl PromptTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_phase<I, S>(mut self, key: impl Into<String>, prompts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prompts
            .insert(key.into(), prompts.into_iter().map(Into::into).collect());
        self
    }

    /// Key whose prompts are used for phases without their own list.
    pub fn with_fallback(mut self, key: impl Into<String>) -> Self {
        self.fallback = Some(key.into());
        self
    }

    pub fn for_phase(&self, key: &str) -> &[String] {
        self.prompts
            .get(key)
            .filter(|p| !p.is_empty())
            .or_else(|| self.fallback.as_ref().and_then(|f| self.prompts.get(f)))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Index of the active prompt: rotates once per minute of the phase and
/// wraps around the list.
pub fn prompt_index(elapsed_in_phase_secs: u32, prompt_count: usize) -> Option<usize> {
    if prompt_count == 0 {
        return None;
    }
    Some((elapsed_in_phase_secs / 60) as usize % prompt_count)
}

pub const MEAL_KEY: &str = "meal";
pub const POST_MEAL_KEY: &str = "post";
pub const PRACTICE_KEY: &str = "practice";

pub fn meal_support_phases(meal_minutes: u32, post_minutes: u32) -> Vec<SessionPhase> {
    vec![
        SessionPhase::new(MEAL_KEY, "Meal", meal_minutes),
        SessionPhase::new(POST_MEAL_KEY, "Post-meal", post_minutes),
    ]
}

pub fn meal_support_prompts() -> PromptTable {
    PromptTable::new()
        .with_phase(
            MEAL_KEY,
            [
                "Slow down and chew until it's easy to swallow",
                "Bring your attention back to your plate and yourself",
                "Give your body some trust: it's learning to receive",
                "Breathe: inhale for 4 seconds, exhale for 6 seconds",
            ],
        )
        .with_phase(
            POST_MEAL_KEY,
            [
                "You've done it, well done",
                "Take a sip of warm water and stretch a little",
                "Feel the sense of safety in your body right now",
                "Say something gentle to yourself",
            ],
        )
        .with_fallback(MEAL_KEY)
}

/// Meal + post-meal minute pairs offered as one-key presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, strum_macros::Display)]
pub enum Preset {
    #[value(name = "15+15")]
    #[strum(serialize = "15 + 15")]
    Short,
    #[value(name = "20+20")]
    #[strum(serialize = "20 + 20")]
    Standard,
    #[value(name = "25+15")]
    #[strum(serialize = "25 + 15")]
    LongMeal,
    #[value(name = "10+20")]
    #[strum(serialize = "10 + 20")]
    LongRest,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::Short,
        Preset::Standard,
        Preset::LongMeal,
        Preset::LongRest,
    ];

    pub fn minutes(&self) -> (u32, u32) {
        match self {
            Preset::Short => (15, 15),
            Preset::Standard => (20, 20),
            Preset::LongMeal => (25, 15),
            Preset::LongRest => (10, 20),
        }
    }
}

/// A one-minute guided practice whose prompts are the exercise steps.
pub fn practice_session<I, S>(steps: I) -> (Vec<SessionPhase>, PromptTable)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    (
        vec![SessionPhase::new(PRACTICE_KEY, "Practice", 1)],
        PromptTable::new().with_phase(PRACTICE_KEY, steps),
    )
}

pub fn grounding_steps() -> Vec<&'static str> {
    vec![
        "Name 5 things you can see",
        "Name 4 things you can feel",
        "Name 3 things you can hear",
        "Name 2 things you can smell",
        "Name 1 thing you can taste",
    ]
}
