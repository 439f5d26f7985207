//! Event triggers
//!
//! A trigger names the events it is interested in and optionally narrows
//! them to a set of characters and worlds. The same constraints produce the
//! subscribe message sent to the server and filter the events received,
//! since one connection carries the union of every trigger's subscription.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::event::{is_character_event, Event, GainExperience};

type Condition = Arc<dyn Fn(&Event) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct Trigger {
    name: Option<String>,
    events: BTreeSet<String>,
    characters: Vec<u64>,
    worlds: Vec<u64>,
    logical_and: Option<bool>,
    conditions: Vec<Condition>,
    single_shot: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubscribeMessage<'a> {
    action: &'static str,
    event_names: Vec<&'a str>,
    service: &'static str,
    characters: Vec<String>,
    worlds: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    logical_and_characters_with_worlds: Option<&'static str>,
}

fn ids_or_all(ids: &[u64]) -> Vec<String> {
    if ids.is_empty() {
        vec!["all".to_string()]
    } else {
        ids.iter().map(u64::to_string).collect()
    }
}

impl Trigger {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            name: None,
            events: BTreeSet::from([event.into()]),
            characters: Vec::new(),
            worlds: Vec::new(),
            logical_and: None,
            conditions: Vec::new(),
            single_shot: false,
        }
    }

    /// Also trigger on `event`
    pub fn event(mut self, event: impl Into<String>) -> Self {
        self.events.insert(event.into());
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn characters(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.characters.extend(ids);
        self
    }

    pub fn worlds(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.worlds.extend(ids);
        self
    }

    /// Require events to match both the character and the world constraints
    /// on the server side
    pub fn logical_and(mut self, logical_and: bool) -> Self {
        self.logical_and = Some(logical_and);
        self
    }

    /// Extra predicate checked for every matching event
    pub fn condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        self.conditions.push(Arc::new(condition));
        self
    }

    /// Remove the trigger after it first fires
    pub fn single_shot(mut self) -> Self {
        self.single_shot = true;
        self
    }

    /// Name used in logs and dispatch results; the event names if unset
    pub fn name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.events.iter().cloned().collect::<Vec<_>>().join("+")
        })
    }

    pub fn is_single_shot(&self) -> bool {
        self.single_shot
    }

    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(String::as_str)
    }

    fn matches_event_name(&self, event: &Event) -> bool {
        if self.events.contains(event.event_name()) {
            return true;
        }
        match event {
            Event::GainExperience(gain) => self
                .events
                .contains(&GainExperience::filter_experience(gain.experience_id)),
            _ => false,
        }
    }

    /// Whether this trigger fires for `event`.
    ///
    /// With character constraints, either the subject or the attacker of
    /// the event may match.
    pub fn check(&self, event: &Event) -> bool {
        if !self.matches_event_name(event) {
            return false;
        }
        if !self.characters.is_empty() {
            let involved = [event.character_id(), event.attacker_character_id()];
            if !involved
                .iter()
                .flatten()
                .any(|id| self.characters.contains(id))
            {
                return false;
            }
        }
        if !self.worlds.is_empty() {
            match event.world_id() {
                Some(world_id) if self.worlds.contains(&world_id) => {}
                _ => return false,
            }
        }
        self.conditions.iter().all(|condition| condition(event))
    }

    /// JSON subscribe message for this trigger.
    ///
    /// Character-centric events subscribed by world only get
    /// `logicalAndCharactersWithWorlds` set, as the implicit "all"
    /// characters would otherwise match every world.
    pub fn subscription(&self) -> serde_json::Result<String> {
        let logical_and = match self.logical_and {
            Some(true) => Some("true"),
            Some(false) => Some("false"),
            None if !self.worlds.is_empty()
                && self.characters.is_empty()
                && self.events.iter().any(|e| is_character_event(e)) =>
            {
                Some("true")
            }
            None => None,
        };
        serde_json::to_string(&SubscribeMessage {
            action: "subscribe",
            event_names: self.events().collect(),
            service: "event",
            characters: ids_or_all(&self.characters),
            worlds: ids_or_all(&self.worlds),
            logical_and_characters_with_worlds: logical_and,
        })
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("name", &self.name)
            .field("events", &self.events)
            .field("characters", &self.characters)
            .field("worlds", &self.worlds)
            .field("logical_and", &self.logical_and)
            .field("conditions", &self.conditions.len())
            .field("single_shot", &self.single_shot)
            .finish()
    }
}
