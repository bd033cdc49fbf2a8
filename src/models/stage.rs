use std::fmt;
use std::str::FromStr;

use crate::status::StatusError;

/// Selection-process stage key.
///
/// Declaration order is the precedence order used when resolving the
/// active stage: interviews and ES outrank an offer if both are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageKey {
    Briefing,
    Es,
    First,
    Second,
    Final,
    Other,
    Offer,
}

/// Static description of a stage (id, display label, state handling)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageDefinition {
    pub key: StageKey,
    pub id: &'static str,
    pub label: &'static str,
    pub has_state: bool,
    pub allows_custom: bool,
}

/// All stages in precedence order
pub const STAGE_DEFINITIONS: [StageDefinition; 7] = [
    StageDefinition { key: StageKey::Briefing, id: "briefing", label: "企業説明会", has_state: true, allows_custom: false },
    StageDefinition { key: StageKey::Es, id: "es", label: "ES提出", has_state: true, allows_custom: false },
    StageDefinition { key: StageKey::First, id: "first", label: "一次面接", has_state: true, allows_custom: false },
    StageDefinition { key: StageKey::Second, id: "second", label: "二次面接", has_state: true, allows_custom: false },
    StageDefinition { key: StageKey::Final, id: "final", label: "最終面接", has_state: true, allows_custom: false },
    StageDefinition { key: StageKey::Other, id: "other", label: "その他", has_state: true, allows_custom: true },
    StageDefinition { key: StageKey::Offer, id: "offer", label: "内定", has_state: false, allows_custom: false },
];

/// Companion key holding the free-text detail of the `other` stage
pub const OTHER_CUSTOM_KEY: &str = "other_custom";

impl StageKey {
    pub fn definition(&self) -> &'static StageDefinition {
        // Array index matches declaration order
        &STAGE_DEFINITIONS[*self as usize]
    }

    pub fn as_str(&self) -> &'static str {
        self.definition().id
    }

    pub fn label(&self) -> &'static str {
        self.definition().label
    }

    pub fn has_state(&self) -> bool {
        self.definition().has_state
    }
}

impl FromStr for StageKey {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        STAGE_DEFINITIONS
            .iter()
            .find(|d| d.id == needle)
            .map(|d| d.key)
            .ok_or_else(|| StatusError::UnknownStage(s.to_string()))
    }
}

impl fmt::Display for StageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State carried by every stage except the offer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    /// 予約
    Reserved,
    /// 済
    Done,
}

impl StageState {
    pub const RESERVED: &'static str = "予約";
    pub const DONE: &'static str = "済";

    pub fn as_str(&self) -> &'static str {
        match self {
            StageState::Reserved => Self::RESERVED,
            StageState::Done => Self::DONE,
        }
    }

    /// Exact match on the stored value
    pub fn from_stored(s: &str) -> Option<Self> {
        match s {
            Self::RESERVED => Some(StageState::Reserved),
            Self::DONE => Some(StageState::Done),
            _ => None,
        }
    }

    /// Lenient match for command-line input
    pub fn parse(s: &str) -> Result<Self, StatusError> {
        if let Some(state) = Self::from_stored(s.trim()) {
            return Ok(state);
        }
        match s.trim().to_ascii_lowercase().as_str() {
            "reserved" | "scheduled" | "yoyaku" => Ok(StageState::Reserved),
            "done" | "completed" | "sumi" => Ok(StageState::Done),
            _ => Err(StatusError::InvalidState(s.to_string())),
        }
    }
}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed view of the exclusive stage selection.
///
/// `Legacy` holds a bare pre-JSON `other` value that is not a valid state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    None,
    Briefing(StageState),
    Es(StageState),
    First(StageState),
    Second(StageState),
    Final(StageState),
    Other { state: StageState, custom: Option<String> },
    Offer,
    Legacy(String),
}

impl Stage {
    pub fn key(&self) -> Option<StageKey> {
        match self {
            Stage::None | Stage::Legacy(_) => None,
            Stage::Briefing(_) => Some(StageKey::Briefing),
            Stage::Es(_) => Some(StageKey::Es),
            Stage::First(_) => Some(StageKey::First),
            Stage::Second(_) => Some(StageKey::Second),
            Stage::Final(_) => Some(StageKey::Final),
            Stage::Other { .. } => Some(StageKey::Other),
            Stage::Offer => Some(StageKey::Offer),
        }
    }

    pub fn state(&self) -> Option<StageState> {
        match self {
            Stage::Briefing(s)
            | Stage::Es(s)
            | Stage::First(s)
            | Stage::Second(s)
            | Stage::Final(s) => Some(*s),
            Stage::Other { state, .. } => Some(*state),
            Stage::None | Stage::Offer | Stage::Legacy(_) => None,
        }
    }

    /// Build a stage from a key and state. `state` is ignored for the offer.
    pub fn from_parts(key: StageKey, state: StageState, custom: Option<String>) -> Self {
        match key {
            StageKey::Briefing => Stage::Briefing(state),
            StageKey::Es => Stage::Es(state),
            StageKey::First => Stage::First(state),
            StageKey::Second => Stage::Second(state),
            StageKey::Final => Stage::Final(state),
            StageKey::Other => Stage::Other { state, custom },
            StageKey::Offer => Stage::Offer,
        }
    }

    pub fn is_interview(&self) -> bool {
        matches!(self, Stage::First(_) | Stage::Second(_) | Stage::Final(_))
    }
}
