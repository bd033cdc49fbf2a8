use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Stage, StageDefinition, StageKey, StageState, OTHER_CUSTOM_KEY, STAGE_DEFINITIONS};

/// Keyword marking an offer inside legacy free text
const OFFER_KEYWORD: &str = "内定";

/// Stage map as stored inside `{"statuses": ...}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusData {
    statuses: BTreeMap<String, String>,
}

/// Which encoding a `status_text` value was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusOrigin {
    /// No status recorded
    Empty,
    /// `{"statuses": {...}}`
    Current,
    /// `{"offer": <truthy>}` from before the stage map existed
    LegacyOfferFlag,
    /// Free text, kept as the `other` stage value
    LegacyText,
    /// Free text mentioning an offer; the text itself is dropped
    LegacyOfferText,
}

impl StatusOrigin {
    /// Rows in any legacy encoding should be rewritten once
    pub fn needs_migration(&self) -> bool {
        matches!(
            self,
            StatusOrigin::LegacyOfferFlag | StatusOrigin::LegacyText | StatusOrigin::LegacyOfferText
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedStatus {
    pub data: StatusData,
    pub origin: StatusOrigin,
}

impl StatusData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map holding a single entry
    pub fn single(key: &str, value: &str) -> Self {
        let mut data = Self::new();
        data.statuses.insert(key.to_string(), value.to_string());
        data
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.statuses.get(key).map(String::as_str)
    }

    pub fn get_stage(&self, key: StageKey) -> Option<&str> {
        self.get(key.as_str())
    }

    /// True when `key` holds a non-empty value
    pub fn has(&self, key: &str) -> bool {
        self.get(key).map_or(false, |v| !v.is_empty())
    }

    pub fn other_custom(&self) -> Option<&str> {
        self.get(OTHER_CUSTOM_KEY).filter(|v| !v.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.statuses.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Typed view of the selection
    pub fn stage(&self) -> Stage {
        let def = match active_stage(self) {
            Some(def) => def,
            None => return Stage::None,
        };
        if def.key == StageKey::Offer {
            return Stage::Offer;
        }
        let value = self.get(def.id).unwrap_or_default();
        match StageState::from_stored(value) {
            Some(state) => {
                let custom = if def.allows_custom {
                    self.other_custom().map(str::to_string)
                } else {
                    None
                };
                Stage::from_parts(def.key, state, custom)
            }
            None => Stage::Legacy(value.to_string()),
        }
    }

    /// Stage map for a typed selection
    pub fn from_stage(stage: &Stage) -> Self {
        match stage {
            Stage::None => Self::new(),
            Stage::Offer => Self::single(StageKey::Offer.as_str(), StageState::DONE),
            Stage::Legacy(text) => Self::single(StageKey::Other.as_str(), text),
            Stage::Other { state, custom } => {
                let mut data = Self::single(StageKey::Other.as_str(), state.as_str());
                if let Some(custom) = custom.as_deref().filter(|c| !c.is_empty()) {
                    data.statuses.insert(OTHER_CUSTOM_KEY.to_string(), custom.to_string());
                }
                data
            }
            other => match (other.key(), other.state()) {
                (Some(key), Some(state)) => Self::single(key.as_str(), state.as_str()),
                _ => Self::new(),
            },
        }
    }
}

/// Decode a stored `status_text` value. Never fails.
pub fn parse(status_text: Option<&str>) -> StatusData {
    parse_with_origin(status_text).data
}

/// Decode a stored `status_text` value and report its encoding
pub fn parse_with_origin(status_text: Option<&str>) -> ParsedStatus {
    let text = match status_text {
        Some(text) if !text.is_empty() => text,
        _ => {
            return ParsedStatus { data: StatusData::new(), origin: StatusOrigin::Empty };
        }
    };

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(object)) => {
            if object.get("offer").map_or(false, is_truthy) {
                log::debug!("status_text uses the legacy offer flag");
                return ParsedStatus {
                    data: StatusData::single(StageKey::Offer.as_str(), StageState::DONE),
                    origin: StatusOrigin::LegacyOfferFlag,
                };
            }
            let statuses = match object.get("statuses") {
                Some(Value::Object(map)) => map
                    .iter()
                    .filter_map(|(k, v)| json_value_text(v).map(|text| (k.clone(), text)))
                    .collect(),
                _ => BTreeMap::new(),
            };
            ParsedStatus { data: StatusData { statuses }, origin: StatusOrigin::Current }
        }
        // Arrays parse as objects without statuses
        Ok(Value::Array(_)) => ParsedStatus { data: StatusData::new(), origin: StatusOrigin::Current },
        _ => parse_legacy_text(text),
    }
}

fn parse_legacy_text(text: &str) -> ParsedStatus {
    if text.contains(OFFER_KEYWORD) {
        log::debug!("legacy status text mentions an offer, dropping text: {:?}", text);
        ParsedStatus {
            data: StatusData::single(StageKey::Offer.as_str(), StageState::DONE),
            origin: StatusOrigin::LegacyOfferText,
        }
    } else {
        log::debug!("legacy status text kept as 'other': {:?}", text);
        ParsedStatus {
            data: StatusData::single(StageKey::Other.as_str(), text),
            origin: StatusOrigin::LegacyText,
        }
    }
}

/// JavaScript truthiness of a JSON value
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn json_value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null | Value::Bool(false) => Some(String::new()),
        Value::Bool(true) => Some("true".to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Encode a stage map in the current `{"statuses": ...}` format
pub fn serialize(data: &StatusData) -> String {
    serde_json::json!({ "statuses": data }).to_string()
}

/// Select `key` exclusively.
///
/// A non-empty `value` replaces the whole map with `{key: value}`; the `other`
/// stage keeps an existing `other_custom`. An empty or absent `value` clears
/// `key`, and clears `other_custom` unless `key` is `other`.
pub fn set_active_stage(current: &StatusData, key: StageKey, value: Option<&str>) -> StatusData {
    let keeps_custom = key == StageKey::Other;

    match value.filter(|v| !v.is_empty()) {
        Some(value) => {
            let mut next = StatusData::single(key.as_str(), value);
            if keeps_custom {
                if let Some(custom) = current.other_custom() {
                    next.statuses.insert(OTHER_CUSTOM_KEY.to_string(), custom.to_string());
                }
            }
            next
        }
        None => {
            let mut next = current.clone();
            next.statuses.remove(key.as_str());
            if !keeps_custom {
                next.statuses.remove(OTHER_CUSTOM_KEY);
            }
            next
        }
    }
}

/// Set or clear the free-text detail of the `other` stage
pub fn set_other_custom(current: &StatusData, custom: &str) -> StatusData {
    let mut next = current.clone();
    let custom = custom.trim();
    if custom.is_empty() {
        next.statuses.remove(OTHER_CUSTOM_KEY);
    } else {
        next.statuses.insert(OTHER_CUSTOM_KEY.to_string(), custom.to_string());
    }
    next
}

/// First stage, in precedence order, holding a non-empty value
pub fn active_stage(data: &StatusData) -> Option<&'static StageDefinition> {
    STAGE_DEFINITIONS.iter().find(|def| data.has(def.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(pairs: &[(&str, &str)]) -> StatusData {
        let mut d = StatusData::new();
        for (k, v) in pairs {
            d.statuses.insert(k.to_string(), v.to_string());
        }
        d
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse(None).is_empty());
        assert!(parse(Some("")).is_empty());
        assert_eq!(parse_with_origin(None).origin, StatusOrigin::Empty);
    }

    #[test]
    fn test_parse_current_format() {
        let parsed = parse_with_origin(Some(r#"{"statuses":{"es":"済"}}"#));
        assert_eq!(parsed.data, data(&[("es", "済")]));
        assert_eq!(parsed.origin, StatusOrigin::Current);
        assert!(!parsed.origin.needs_migration());
    }

    #[test]
    fn test_parse_object_without_statuses() {
        assert!(parse(Some(r#"{"note":"x"}"#)).is_empty());
        assert!(parse(Some(r#"{"statuses":"es"}"#)).is_empty());
        assert!(parse(Some("[1,2]")).is_empty());
    }

    #[test]
    fn test_parse_legacy_offer_flag() {
        let parsed = parse_with_origin(Some(r#"{"offer":true}"#));
        assert_eq!(parsed.data, data(&[("offer", "済")]));
        assert_eq!(parsed.origin, StatusOrigin::LegacyOfferFlag);
        assert!(parsed.origin.needs_migration());

        // Falsy flag falls through to the statuses map
        let parsed = parse(Some(r#"{"offer":false,"statuses":{"first":"予約"}}"#));
        assert_eq!(parsed, data(&[("first", "予約")]));
        assert_eq!(parse(Some(r#"{"offer":"yes"}"#)), data(&[("offer", "済")]));
        assert!(parse(Some(r#"{"offer":0}"#)).is_empty());
    }

    #[test]
    fn test_parse_legacy_text() {
        let parsed = parse_with_origin(Some("面接待ち"));
        assert_eq!(parsed.data, data(&[("other", "面接待ち")]));
        assert_eq!(parsed.origin, StatusOrigin::LegacyText);

        let parsed = parse_with_origin(Some("なんとなく内定した"));
        assert_eq!(parsed.data, data(&[("offer", "済")]));
        assert_eq!(parsed.origin, StatusOrigin::LegacyOfferText);
    }

    #[test]
    fn test_parse_non_object_json_is_legacy_text() {
        assert_eq!(parse(Some("42")), data(&[("other", "42")]));
        assert_eq!(parse(Some("null")), data(&[("other", "null")]));
        assert_eq!(parse(Some("\"内定\"")), data(&[("offer", "済")]));
    }

    #[test]
    fn test_parse_scalar_values_in_statuses() {
        let parsed = parse(Some(r#"{"statuses":{"offer":true,"es":null,"x":{"a":1}}}"#));
        assert_eq!(parsed, data(&[("offer", "true"), ("es", "")]));
    }

    #[test]
    fn test_serialize_current_format() {
        let encoded = serialize(&data(&[("first", "予約")]));
        assert_eq!(encoded, r#"{"statuses":{"first":"予約"}}"#);
        assert_eq!(serialize(&StatusData::new()), r#"{"statuses":{}}"#);
    }

    #[test]
    fn test_reparse_is_stable() {
        let inputs = [
            None,
            Some(r#"{"statuses":{"other":"済","other_custom":"座談会"}}"#),
            Some(r#"{"offer":1}"#),
            Some("書類選考中"),
            Some("内定もらった"),
        ];
        for input in inputs {
            let first = parse(input);
            let encoded = serialize(&first);
            let second = parse_with_origin(Some(&encoded));
            assert_eq!(second.data, first, "input {:?}", input);
            assert_eq!(second.origin, StatusOrigin::Current);
        }
    }

    #[test]
    fn test_set_active_stage_is_exclusive() {
        let current = data(&[("es", "済")]);
        let next = set_active_stage(&current, StageKey::First, Some("予約"));
        assert_eq!(next, data(&[("first", "予約")]));
        // Input untouched
        assert_eq!(current, data(&[("es", "済")]));
    }

    #[test]
    fn test_set_active_stage_keeps_other_custom() {
        let current = data(&[("other", "x"), ("other_custom", "detail")]);
        let next = set_active_stage(&current, StageKey::Other, Some("済"));
        assert_eq!(next, data(&[("other", "済"), ("other_custom", "detail")]));

        let next = set_active_stage(&current, StageKey::Final, Some("予約"));
        assert_eq!(next, data(&[("final", "予約")]));
    }

    #[test]
    fn test_set_active_stage_clear() {
        let current = data(&[("other", "予約"), ("other_custom", "detail")]);
        assert_eq!(
            set_active_stage(&current, StageKey::Other, None),
            data(&[("other_custom", "detail")])
        );
        assert!(set_active_stage(&data(&[("es", "済")]), StageKey::Es, Some("")).is_empty());
        assert!(set_active_stage(&current, StageKey::Es, None).get("other_custom").is_none());
    }

    #[test]
    fn test_set_other_custom() {
        let current = data(&[("other", "予約")]);
        let next = set_other_custom(&current, " OB訪問 ");
        assert_eq!(next.other_custom(), Some("OB訪問"));
        assert_eq!(set_other_custom(&next, "").other_custom(), None);
    }

    #[test]
    fn test_active_stage_precedence() {
        assert!(active_stage(&StatusData::new()).is_none());
        let both = data(&[("offer", "済"), ("second", "予約")]);
        assert_eq!(active_stage(&both).map(|d| d.key), Some(StageKey::Second));
        let empty_value = data(&[("es", ""), ("final", "済")]);
        assert_eq!(active_stage(&empty_value).map(|d| d.key), Some(StageKey::Final));
        assert!(active_stage(&data(&[("other_custom", "x")])).is_none());
    }

    #[test]
    fn test_stage_view() {
        assert_eq!(StatusData::new().stage(), Stage::None);
        assert_eq!(data(&[("es", "予約")]).stage(), Stage::Es(StageState::Reserved));
        assert_eq!(data(&[("offer", "済")]).stage(), Stage::Offer);
        assert_eq!(
            data(&[("other", "済"), ("other_custom", "座談会")]).stage(),
            Stage::Other { state: StageState::Done, custom: Some("座談会".to_string()) }
        );
        assert_eq!(data(&[("other", "面接待ち")]).stage(), Stage::Legacy("面接待ち".to_string()));
    }

    #[test]
    fn test_from_stage_round_trip() {
        let stages = [
            Stage::None,
            Stage::Briefing(StageState::Done),
            Stage::Final(StageState::Reserved),
            Stage::Other { state: StageState::Reserved, custom: Some("インターン".to_string()) },
            Stage::Other { state: StageState::Done, custom: None },
            Stage::Offer,
            Stage::Legacy("保留".to_string()),
        ];
        for stage in stages {
            assert_eq!(StatusData::from_stage(&stage).stage(), stage);
        }
    }
}
