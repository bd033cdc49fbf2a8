// Derived predicates and display label over a stored status_text

use crate::models::{StageKey, StageState};
use super::codec::{active_stage, parse, StatusData};

impl StatusData {
    pub fn has_offer(&self) -> bool {
        self.has(StageKey::Offer.as_str())
    }

    pub fn has_interview(&self) -> bool {
        [StageKey::First, StageKey::Second, StageKey::Final]
            .iter()
            .any(|key| self.has(key.as_str()))
    }

    /// Anything recorded, but no offer yet
    pub fn is_in_progress(&self) -> bool {
        !self.has_offer() && !self.is_empty()
    }
}

pub fn has_offer(status_text: Option<&str>) -> bool {
    parse(status_text).has_offer()
}

pub fn has_interview(status_text: Option<&str>) -> bool {
    parse(status_text).has_interview()
}

pub fn is_in_progress(status_text: Option<&str>) -> bool {
    parse(status_text).is_in_progress()
}

/// ES still to be submitted: nothing recorded, no `es` stage, or `es` only reserved
pub fn is_pending_es(status_text: Option<&str>) -> bool {
    let text = match status_text {
        Some(text) if !text.is_empty() => text,
        _ => return true,
    };
    match parse(Some(text)).get_stage(StageKey::Es) {
        None | Some("") => true,
        Some(state) => state == StageState::RESERVED,
    }
}

/// Short label for list rows and cards
pub fn short_label(status_text: Option<&str>) -> String {
    let text = match status_text {
        Some(text) if !text.is_empty() => text,
        _ => return String::new(),
    };
    let data = parse(Some(text));

    if data.has_offer() {
        return StageKey::Offer.label().to_string();
    }

    // Bare legacy text is shown as-is
    if let Some(other) = data.get_stage(StageKey::Other) {
        if data.len() == 1 && !other.is_empty() && StageState::from_stored(other).is_none() {
            return other.to_string();
        }
    }

    let def = match active_stage(&data) {
        Some(def) => def,
        None => return String::new(),
    };
    let state = data.get(def.id).unwrap_or_default();

    if def.allows_custom {
        if let Some(custom) = data.other_custom() {
            return format!("{}({})", custom, state);
        }
    }
    if def.has_state {
        format!("{}({})", def.label, state)
    } else {
        def.label.to_string()
    }
}
