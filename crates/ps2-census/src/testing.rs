//! In-memory record source for tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use census_api::{CensusError, SearchModifier};
use serde_json::{json, Value};

use crate::error::Result;
use crate::filter::Filter;
use crate::kind::EntityKind;
use crate::source::RecordSource;

/// Record source serving inserted payloads and counting every fetch
pub(crate) struct MockSource {
    records: Mutex<HashMap<EntityKind, Vec<Value>>>,
    one_calls: AtomicUsize,
    many_calls: AtomicUsize,
    failing: AtomicBool,
    delay: Mutex<Duration>,
}

impl MockSource {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            one_calls: AtomicUsize::new(0),
            many_calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            delay: Mutex::new(Duration::ZERO),
        }
    }

    pub fn insert(&self, kind: EntityKind, record: Value) {
        self.records
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .push(record);
    }

    /// Make every subsequent fetch fail with a transport error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Delay every fetch by `delay`
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn one_calls(&self) -> usize {
        self.one_calls.load(Ordering::SeqCst)
    }

    pub fn many_calls(&self) -> usize {
        self.many_calls.load(Ordering::SeqCst)
    }

    async fn simulate(&self) -> Result<()> {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(CensusError::ServiceUnavailable {
                url: "mock://census".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn matching(&self, kind: EntityKind, filter: &Filter) -> Vec<Value> {
        self.records
            .lock()
            .unwrap()
            .get(&kind)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| matches(r, filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn lookup<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(record, |value, key| value.get(key))
}

fn matches(record: &Value, filter: &Filter) -> bool {
    filter.terms().iter().all(|term| {
        let actual = match lookup(record, &term.field) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => return false,
        };
        let (actual, expected) = if filter.is_case_insensitive() {
            (actual.to_lowercase(), term.value.to_lowercase())
        } else {
            (actual, term.value.clone())
        };
        match term.modifier {
            SearchModifier::NotEqual => actual != expected,
            _ => actual == expected,
        }
    })
}

#[async_trait]
impl RecordSource for MockSource {
    async fn fetch_one(&self, kind: EntityKind, filter: &Filter) -> Result<Option<Value>> {
        self.one_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;
        Ok(self.matching(kind, filter).into_iter().next())
    }

    async fn fetch_many(
        &self,
        kind: EntityKind,
        filter: &Filter,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Value>> {
        self.many_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;
        Ok(self
            .matching(kind, filter)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self, kind: EntityKind, filter: &Filter) -> Result<u64> {
        self.simulate().await?;
        Ok(self.matching(kind, filter).len() as u64)
    }
}

pub(crate) fn character(id: u64, name: &str, faction_id: u64, title_id: u64) -> Value {
    json!({
        "character_id": id.to_string(),
        "name": {"first": name, "first_lower": name.to_lowercase()},
        "faction_id": faction_id.to_string(),
        "title_id": title_id.to_string(),
        "battle_rank": {"value": "100", "percent_to_next": "12"}
    })
}

pub(crate) fn faction(id: u64, name: &str) -> Value {
    json!({
        "faction_id": id.to_string(),
        "name": {"en": name, "de": format!("{} (de)", name)},
        "code_tag": "",
        "user_selectable": "1"
    })
}

pub(crate) fn world(id: u64, name: &str) -> Value {
    json!({
        "world_id": id.to_string(),
        "state": "online",
        "name": {"en": name, "de": name}
    })
}

pub(crate) fn title(id: u64, name: &str) -> Value {
    json!({
        "title_id": id.to_string(),
        "name": {"en": name}
    })
}

pub(crate) fn item(id: u64, name: &str, faction_id: Option<u64>) -> Value {
    let mut item = json!({
        "item_id": id.to_string(),
        "name": {"en": name},
        "is_vehicle_weapon": "0"
    });
    if let Some(faction_id) = faction_id {
        item["faction_id"] = json!(faction_id.to_string());
    }
    item
}

pub(crate) fn outfit(id: u64, name: &str, leader_id: u64) -> Value {
    json!({
        "outfit_id": id.to_string(),
        "name": name,
        "name_lower": name.to_lowercase(),
        "alias": "",
        "alias_lower": "",
        "time_created": "1408310427",
        "leader_character_id": leader_id.to_string(),
        "member_count": "3"
    })
}

pub(crate) fn outfit_member(outfit_id: u64, character_id: u64, rank_ordinal: u64) -> Value {
    json!({
        "outfit_id": outfit_id.to_string(),
        "character_id": character_id.to_string(),
        "member_since": "1408310427",
        "rank": "Member",
        "rank_ordinal": rank_ordinal.to_string()
    })
}
