//! Event types emitted by the ESS subscription

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::de;

/// Messages emitted by the ESS subscription
#[derive(Debug, Clone)]
pub enum EssEvent {
    /// A game event matched by at least one trigger
    Event {
        triggers: Vec<String>,
        event: Event,
    },
    /// Heartbeat carrying the online state of every event server
    Heartbeat(HashMap<String, bool>),
    /// A single event server went online or offline
    ServiceStateChanged { server: String, online: bool },
    /// Successfully connected to the push endpoint
    Connected,
    /// Disconnected from the push endpoint
    Disconnected,
    /// An error occurred
    Error(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Death {
    #[serde(deserialize_with = "de::int")]
    pub attacker_character_id: u64,
    #[serde(default, deserialize_with = "de::int")]
    pub attacker_fire_mode_id: u64,
    #[serde(default, deserialize_with = "de::int")]
    pub attacker_loadout_id: u64,
    #[serde(default, deserialize_with = "de::int")]
    pub attacker_vehicle_id: u64,
    #[serde(default, deserialize_with = "de::int")]
    pub attacker_weapon_id: u64,
    #[serde(deserialize_with = "de::int")]
    pub character_id: u64,
    #[serde(default, deserialize_with = "de::int")]
    pub character_loadout_id: u64,
    #[serde(default, deserialize_with = "de::flag")]
    pub is_headshot: bool,
    #[serde(default, deserialize_with = "de::int")]
    pub vehicle_id: u64,
    #[serde(deserialize_with = "de::int")]
    pub world_id: u64,
    #[serde(default, deserialize_with = "de::int")]
    pub zone_id: u64,
    #[serde(deserialize_with = "de::timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl Death {
    /// Deaths to fall damage or other non-player sources report attacker 0
    pub fn is_suicide(&self) -> bool {
        self.attacker_character_id == self.character_id || self.attacker_character_id == 0
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleDestroy {
    #[serde(deserialize_with = "de::int")]
    pub attacker_character_id: u64,
    #[serde(default, deserialize_with = "de::int")]
    pub attacker_loadout_id: u64,
    #[serde(default, deserialize_with = "de::int")]
    pub attacker_vehicle_id: u64,
    #[serde(default, deserialize_with = "de::int")]
    pub attacker_weapon_id: u64,
    #[serde(deserialize_with = "de::int")]
    pub character_id: u64,
    #[serde(default, deserialize_with = "de::int")]
    pub facility_id: u64,
    #[serde(default, deserialize_with = "de::int")]
    pub faction_id: u64,
    #[serde(default, deserialize_with = "de::int")]
    pub vehicle_id: u64,
    #[serde(deserialize_with = "de::int")]
    pub world_id: u64,
    #[serde(default, deserialize_with = "de::int")]
    pub zone_id: u64,
    #[serde(deserialize_with = "de::timestamp")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GainExperience {
    #[serde(deserialize_with = "de::int")]
    pub amount: u64,
    #[serde(deserialize_with = "de::int")]
    pub character_id: u64,
    #[serde(deserialize_with = "de::int")]
    pub experience_id: u64,
    #[serde(default, deserialize_with = "de::int")]
    pub loadout_id: u64,
    #[serde(default, deserialize_with = "de::int")]
    pub other_id: u64,
    #[serde(deserialize_with = "de::int")]
    pub world_id: u64,
    #[serde(default, deserialize_with = "de::int")]
    pub zone_id: u64,
    #[serde(deserialize_with = "de::timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl GainExperience {
    /// Event name subscribing to a single experience type
    pub fn filter_experience(experience_id: u64) -> String {
        format!("GainExperience_experience_id_{}", experience_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerLogin {
    #[serde(deserialize_with = "de::int")]
    pub character_id: u64,
    #[serde(deserialize_with = "de::int")]
    pub world_id: u64,
    #[serde(deserialize_with = "de::timestamp")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerLogout {
    #[serde(deserialize_with = "de::int")]
    pub character_id: u64,
    #[serde(deserialize_with = "de::int")]
    pub world_id: u64,
    #[serde(deserialize_with = "de::timestamp")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContinentLock {
    #[serde(deserialize_with = "de::int")]
    pub zone_id: u64,
    #[serde(default, deserialize_with = "de::int")]
    pub triggering_faction: u64,
    #[serde(default, deserialize_with = "de::int")]
    pub previous_faction: u64,
    #[serde(default, deserialize_with = "de::float")]
    pub vs_population: f64,
    #[serde(default, deserialize_with = "de::float")]
    pub nc_population: f64,
    #[serde(default, deserialize_with = "de::float")]
    pub tr_population: f64,
    #[serde(default, deserialize_with = "de::int")]
    pub metagame_event_id: u64,
    #[serde(deserialize_with = "de::int")]
    pub world_id: u64,
    #[serde(deserialize_with = "de::timestamp")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FacilityControl {
    #[serde(default, deserialize_with = "de::int")]
    pub duration_held: u64,
    #[serde(deserialize_with = "de::int")]
    pub facility_id: u64,
    #[serde(deserialize_with = "de::int")]
    pub new_faction_id: u64,
    #[serde(deserialize_with = "de::int")]
    pub old_faction_id: u64,
    #[serde(default, deserialize_with = "de::int")]
    pub outfit_id: u64,
    #[serde(deserialize_with = "de::int")]
    pub world_id: u64,
    #[serde(default, deserialize_with = "de::int")]
    pub zone_id: u64,
    #[serde(deserialize_with = "de::timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl FacilityControl {
    /// Whether the facility changed hands, as opposed to being defended
    pub fn is_capture(&self) -> bool {
        self.new_faction_id != self.old_faction_id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetagameEvent {
    #[serde(default, deserialize_with = "de::float")]
    pub experience_bonus: f64,
    #[serde(default, deserialize_with = "de::float")]
    pub faction_nc: f64,
    #[serde(default, deserialize_with = "de::float")]
    pub faction_tr: f64,
    #[serde(default, deserialize_with = "de::float")]
    pub faction_vs: f64,
    #[serde(default, deserialize_with = "de::int")]
    pub instance_id: u64,
    #[serde(deserialize_with = "de::int")]
    pub metagame_event_id: u64,
    #[serde(deserialize_with = "de::int")]
    pub metagame_event_state: u64,
    #[serde(default)]
    pub metagame_event_state_name: String,
    #[serde(deserialize_with = "de::int")]
    pub world_id: u64,
    #[serde(default, deserialize_with = "de::int")]
    pub zone_id: u64,
    #[serde(deserialize_with = "de::timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Event without a typed model; the payload is kept as received
#[derive(Debug, Clone)]
pub struct RawEvent {
    pub event_name: String,
    pub world_id: Option<u64>,
    pub payload: Value,
}

impl RawEvent {
    fn field(&self, name: &str) -> Option<u64> {
        match self.payload.get(name)? {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
    }
}

/// A game event received through the stream
#[derive(Debug, Clone)]
pub enum Event {
    Death(Death),
    VehicleDestroy(VehicleDestroy),
    GainExperience(GainExperience),
    PlayerLogin(PlayerLogin),
    PlayerLogout(PlayerLogout),
    ContinentLock(ContinentLock),
    FacilityControl(FacilityControl),
    MetagameEvent(MetagameEvent),
    Other(RawEvent),
}

/// Events that can be subscribed to by character ID
pub(crate) const CHARACTER_EVENTS: &[&str] = &[
    "AchievementAdded",
    "BattleRankUp",
    "Death",
    "GainExperience",
    "ItemAdded",
    "PlayerFacilityCapture",
    "PlayerFacilityDefend",
    "PlayerLogin",
    "PlayerLogout",
    "SkillAdded",
    "VehicleDestroy",
];

pub(crate) fn is_character_event(name: &str) -> bool {
    CHARACTER_EVENTS.contains(&name) || name.starts_with("GainExperience_experience_id_")
}

fn typed<T: DeserializeOwned>(payload: Value) -> serde_json::Result<T> {
    serde_json::from_value(payload)
}

impl Event {
    /// Build an event from a `serviceMessage` payload.
    ///
    /// Payloads with an unknown `event_name` become [`Event::Other`]; known
    /// ones that fail to decode are an error.
    pub fn from_payload(payload: Value) -> serde_json::Result<Self> {
        let name = payload
            .get("event_name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let event = match name.as_str() {
            "Death" => Event::Death(typed(payload)?),
            "VehicleDestroy" => Event::VehicleDestroy(typed(payload)?),
            "GainExperience" => Event::GainExperience(typed(payload)?),
            "PlayerLogin" => Event::PlayerLogin(typed(payload)?),
            "PlayerLogout" => Event::PlayerLogout(typed(payload)?),
            "ContinentLock" => Event::ContinentLock(typed(payload)?),
            "FacilityControl" => Event::FacilityControl(typed(payload)?),
            "MetagameEvent" => Event::MetagameEvent(typed(payload)?),
            _ => {
                let mut raw = RawEvent {
                    event_name: name,
                    world_id: None,
                    payload,
                };
                raw.world_id = raw.field("world_id");
                Event::Other(raw)
            }
        };
        Ok(event)
    }

    pub fn event_name(&self) -> &str {
        match self {
            Event::Death(_) => "Death",
            Event::VehicleDestroy(_) => "VehicleDestroy",
            Event::GainExperience(_) => "GainExperience",
            Event::PlayerLogin(_) => "PlayerLogin",
            Event::PlayerLogout(_) => "PlayerLogout",
            Event::ContinentLock(_) => "ContinentLock",
            Event::FacilityControl(_) => "FacilityControl",
            Event::MetagameEvent(_) => "MetagameEvent",
            Event::Other(raw) => &raw.event_name,
        }
    }

    pub fn world_id(&self) -> Option<u64> {
        match self {
            Event::Death(e) => Some(e.world_id),
            Event::VehicleDestroy(e) => Some(e.world_id),
            Event::GainExperience(e) => Some(e.world_id),
            Event::PlayerLogin(e) => Some(e.world_id),
            Event::PlayerLogout(e) => Some(e.world_id),
            Event::ContinentLock(e) => Some(e.world_id),
            Event::FacilityControl(e) => Some(e.world_id),
            Event::MetagameEvent(e) => Some(e.world_id),
            Event::Other(raw) => raw.world_id,
        }
    }

    /// The character the event is about
    pub fn character_id(&self) -> Option<u64> {
        match self {
            Event::Death(e) => Some(e.character_id),
            Event::VehicleDestroy(e) => Some(e.character_id),
            Event::GainExperience(e) => Some(e.character_id),
            Event::PlayerLogin(e) => Some(e.character_id),
            Event::PlayerLogout(e) => Some(e.character_id),
            Event::Other(raw) => raw.field("character_id"),
            _ => None,
        }
        .filter(|&id| id != 0)
    }

    /// The attacking character, for kill events
    pub fn attacker_character_id(&self) -> Option<u64> {
        match self {
            Event::Death(e) => Some(e.attacker_character_id),
            Event::VehicleDestroy(e) => Some(e.attacker_character_id),
            Event::Other(raw) => raw.field("attacker_character_id"),
            _ => None,
        }
        .filter(|&id| id != 0)
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Event::Death(e) => Some(e.timestamp),
            Event::VehicleDestroy(e) => Some(e.timestamp),
            Event::GainExperience(e) => Some(e.timestamp),
            Event::PlayerLogin(e) => Some(e.timestamp),
            Event::PlayerLogout(e) => Some(e.timestamp),
            Event::ContinentLock(e) => Some(e.timestamp),
            Event::FacilityControl(e) => Some(e.timestamp),
            Event::MetagameEvent(e) => Some(e.timestamp),
            Event::Other(raw) => raw
                .field("timestamp")
                .and_then(|secs| DateTime::from_timestamp(i64::try_from(secs).ok()?, 0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_death_from_payload() {
        let event = Event::from_payload(json!({
            "attacker_character_id": "5428010618015189713",
            "attacker_fire_mode_id": "7390",
            "attacker_loadout_id": "15",
            "attacker_vehicle_id": "0",
            "attacker_weapon_id": "7214",
            "character_id": "5428010618035323201",
            "character_loadout_id": "8",
            "event_name": "Death",
            "is_critical": "0",
            "is_headshot": "1",
            "timestamp": "1704067200",
            "vehicle_id": "0",
            "world_id": "13",
            "zone_id": "2"
        }))
        .unwrap();

        match &event {
            Event::Death(death) => {
                assert!(death.is_headshot);
                assert!(!death.is_suicide());
                assert_eq!(death.timestamp.timestamp(), 1704067200);
            }
            other => panic!("Expected Death, got {:?}", other),
        }
        assert_eq!(event.event_name(), "Death");
        assert_eq!(event.world_id(), Some(13));
        assert_eq!(event.character_id(), Some(5428010618035323201));
        assert_eq!(event.attacker_character_id(), Some(5428010618015189713));
    }

    #[test]
    fn test_world_event_has_no_character() {
        let event = Event::from_payload(json!({
            "duration_held": "3600",
            "event_name": "FacilityControl",
            "facility_id": "222280",
            "new_faction_id": "2",
            "old_faction_id": "3",
            "outfit_id": "0",
            "timestamp": "1704067200",
            "world_id": "17",
            "zone_id": "6"
        }))
        .unwrap();

        match &event {
            Event::FacilityControl(control) => assert!(control.is_capture()),
            other => panic!("Expected FacilityControl, got {:?}", other),
        }
        assert_eq!(event.character_id(), None);
        assert_eq!(event.world_id(), Some(17));
    }

    #[test]
    fn test_unknown_event_kept_raw() {
        let event = Event::from_payload(json!({
            "character_id": "42",
            "event_name": "SkillAdded",
            "skill_id": "9",
            "timestamp": "1704067200",
            "world_id": "1",
            "zone_id": "2"
        }))
        .unwrap();

        match &event {
            Event::Other(raw) => {
                assert_eq!(raw.event_name, "SkillAdded");
                assert_eq!(raw.payload["skill_id"], "9");
            }
            other => panic!("Expected Other, got {:?}", other),
        }
        assert_eq!(event.character_id(), Some(42));
        assert_eq!(event.world_id(), Some(1));
        assert!(event.timestamp().is_some());
    }

    #[test]
    fn test_malformed_known_event_is_error() {
        let result = Event::from_payload(json!({
            "event_name": "PlayerLogin",
            "timestamp": "1704067200",
            "world_id": "1"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_character_events() {
        assert!(is_character_event("Death"));
        assert!(is_character_event(&GainExperience::filter_experience(7)));
        assert!(!is_character_event("FacilityControl"));
        assert!(!is_character_event("MetagameEvent"));
    }
}
