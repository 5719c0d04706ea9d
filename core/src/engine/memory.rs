//! In-memory reference engine
//!
//! Loads a fixed record set from the configuration JSON and answers
//! attribute searches by exact normalized-value matching. It is the engine
//! the server binary ships with and the one integration tests run against.

use super::{EngineFactory, SearchEngine};
use crate::error::{EngineError, EngineErrorKind, InitError};
use crate::flags::SearchFlags;

use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

const DATA_SOURCE: &str = "DATA_SOURCE";
const RECORD_ID: &str = "RECORD_ID";

/// Profiles accepted by [`MemoryEngine::search`]
pub const KNOWN_PROFILES: &[&str] = &["SEARCH", "INGEST"];

/// Profile used when the caller names none
pub const DEFAULT_PROFILE: &str = "SEARCH";

#[derive(Debug)]
struct StoredRecord {
    entity_id: u64,
    data_source: String,
    record_id: String,
    features: BTreeMap<String, String>,
    raw: Map<String, Value>,
}

/// Engine answering searches from an immutable in-memory record set
#[derive(Debug)]
pub struct MemoryEngine {
    instance_name: String,
    records: Vec<StoredRecord>,
    data_sources: BTreeSet<String>,
}

impl MemoryEngine {
    /// Build an engine from configuration JSON
    ///
    /// The configuration must be an object; an optional `records` array
    /// supplies the searchable records, each carrying `DATA_SOURCE` and
    /// `RECORD_ID` strings.
    pub fn from_config(instance_name: &str, config_json: &str) -> Result<Self, InitError> {
        let config: Value = serde_json::from_str(config_json)
            .map_err(|e| InitError::Configuration(e.to_string()))?;
        let Value::Object(mut config) = config else {
            return Err(InitError::Configuration(
                "configuration must be a JSON object".into(),
            ));
        };

        let records = match config.remove("records") {
            None => Vec::new(),
            Some(Value::Array(records)) => records,
            Some(_) => {
                return Err(InitError::Configuration(
                    "'records' must be an array".into(),
                ))
            }
        };

        let mut stored = Vec::with_capacity(records.len());
        let mut data_sources = BTreeSet::new();
        for (index, record) in records.into_iter().enumerate() {
            let record = load_record(index, record)?;
            data_sources.insert(record.data_source.clone());
            stored.push(record);
        }

        tracing::debug!(
            instance = instance_name,
            records = stored.len(),
            data_sources = data_sources.len(),
            "Loaded in-memory records"
        );

        Ok(Self {
            instance_name: instance_name.to_string(),
            records: stored,
            data_sources,
        })
    }

    /// Instance name given at initialization
    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    /// Number of loaded records
    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

fn load_record(index: usize, record: Value) -> Result<StoredRecord, InitError> {
    let Value::Object(raw) = record else {
        return Err(InitError::Configuration(format!(
            "record {index} must be a JSON object"
        )));
    };

    let field = |name: &str| {
        raw.get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| InitError::Configuration(format!("record {index} is missing {name}")))
    };
    let data_source = field(DATA_SOURCE)?.to_ascii_uppercase();
    let record_id = field(RECORD_ID)?;

    Ok(StoredRecord {
        entity_id: index as u64 + 1,
        data_source,
        record_id,
        features: features_of(&raw),
        raw,
    })
}

/// Comparable attribute values, keyed by upper-cased attribute name
fn features_of(attributes: &Map<String, Value>) -> BTreeMap<String, String> {
    attributes
        .iter()
        .filter(|(key, _)| {
            !key.eq_ignore_ascii_case(DATA_SOURCE) && !key.eq_ignore_ascii_case(RECORD_ID)
        })
        .filter_map(|(key, value)| normalize(value).map(|v| (key.to_ascii_uppercase(), v)))
        .collect()
}

fn normalize(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text.to_uppercase())
    }
}

impl SearchEngine for MemoryEngine {
    fn search(
        &self,
        attributes: &str,
        flags: SearchFlags,
        profile: Option<&str>,
    ) -> Result<String, EngineError> {
        let profile = match profile {
            None => DEFAULT_PROFILE.to_string(),
            Some(name) => {
                let upper = name.trim().to_ascii_uppercase();
                if !KNOWN_PROFILES.contains(&upper.as_str()) {
                    return Err(EngineError::bad_input(format!(
                        "unknown search profile: {name}"
                    )));
                }
                upper
            }
        };

        let query: Value = serde_json::from_str(attributes)
            .map_err(|e| EngineError::bad_input(format!("invalid search attributes: {e}")))?;
        let Value::Object(query) = query else {
            return Err(EngineError::bad_input(
                "search attributes must be a JSON object",
            ));
        };

        let source_filter = match query.get(DATA_SOURCE).and_then(Value::as_str) {
            Some(source) => {
                let source = source.trim().to_ascii_uppercase();
                if !self.data_sources.contains(&source) {
                    return Err(EngineError::new(
                        EngineErrorKind::UnknownDataSource,
                        format!("unknown data source: {source}"),
                    ));
                }
                Some(source)
            }
            None => None,
        };

        let wanted = features_of(&query);
        if wanted.is_empty() {
            return Err(EngineError::bad_input(
                "search attributes contain no searchable values",
            ));
        }

        let min_matches = if flags.contains(SearchFlags::SEARCH_BY_ATTRIBUTES_STRONG) {
            2
        } else {
            1
        };

        let mut candidates: Vec<(&StoredRecord, Vec<&str>)> = self
            .records
            .iter()
            .filter(|r| source_filter.as_ref().map_or(true, |s| &r.data_source == s))
            .filter_map(|record| {
                let matched: Vec<&str> = wanted
                    .iter()
                    .filter(|(key, value)| record.features.get(*key) == Some(*value))
                    .map(|(key, _)| key.as_str())
                    .collect();
                (matched.len() >= min_matches).then_some((record, matched))
            })
            .collect();

        candidates.sort_by(|(a, a_keys), (b, b_keys)| {
            b_keys
                .len()
                .cmp(&a_keys.len())
                .then_with(|| a.data_source.cmp(&b.data_source))
                .then_with(|| a.record_id.cmp(&b.record_id))
        });

        let entities: Vec<Value> = candidates
            .iter()
            .map(|(record, matched)| render_entity(record, matched, &wanted, flags))
            .collect();

        let mut answer = Map::new();
        answer.insert("RESOLVED_ENTITIES".into(), Value::Array(entities));
        if flags.contains(SearchFlags::SEARCH_INCLUDE_STATS) {
            answer.insert(
                "SEARCH_STATISTICS".into(),
                json!([{
                    "PROFILE": profile,
                    "RECORDS_SCANNED": self.records.len(),
                    "CANDIDATES_FOUND": candidates.len(),
                    "SEARCH_KEYS": wanted.keys().collect::<Vec<_>>(),
                }]),
            );
        }

        serde_json::to_string(&Value::Object(answer))
            .map_err(|e| EngineError::new(EngineErrorKind::Unhandled, e.to_string()))
    }

    fn probe(&self) -> Result<(), EngineError> {
        Ok(())
    }
}

fn render_entity(
    record: &StoredRecord,
    matched: &[&str],
    wanted: &BTreeMap<String, String>,
    flags: SearchFlags,
) -> Value {
    let match_key: String = matched.iter().map(|k| format!("+{k}")).collect();

    let mut match_info = json!({
        "MATCH_KEY": match_key,
        "MATCH_SCORE": matched.len(),
    });
    if flags.contains(SearchFlags::INCLUDE_MATCH_KEY_DETAILS) {
        let details: Map<String, Value> = matched
            .iter()
            .map(|key| {
                let detail = json!({
                    "INBOUND": wanted.get(*key),
                    "CANDIDATE": record.features.get(*key),
                });
                (key.to_string(), detail)
            })
            .collect();
        match_info["FEATURE_SCORES"] = Value::Object(details);
    }

    let mut summary = json!({
        "DATA_SOURCE": record.data_source,
        "RECORD_ID": record.record_id,
    });
    if flags.contains(SearchFlags::ENTITY_INCLUDE_RECORD_DATA) {
        summary["JSON_DATA"] = Value::Object(record.raw.clone());
    }

    json!({
        "MATCH_INFO": match_info,
        "ENTITY": {
            "RESOLVED_ENTITY": {
                "ENTITY_ID": record.entity_id,
                "RECORDS": [summary],
            }
        }
    })
}

/// Factory producing [`MemoryEngine`] handles
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryEngineFactory;

impl EngineFactory for MemoryEngineFactory {
    fn name(&self) -> &str {
        "memory"
    }

    fn init(
        &self,
        instance_name: &str,
        config_json: &str,
    ) -> Result<Arc<dyn SearchEngine>, InitError> {
        Ok(Arc::new(MemoryEngine::from_config(instance_name, config_json)?))
    }
}
