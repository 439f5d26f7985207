//! PlanetSide 2 Event Streaming Service client
//!
//! Connects to the Census push endpoint, subscribes to the events named by
//! a set of triggers and forwards the matching events over a channel.

pub mod config;
mod de;
pub mod error;
pub mod event;
pub mod subscription;
pub mod trigger;

pub use config::EssConfig;
pub use error::{EssError, Result};
pub use event::{
    ContinentLock, Death, EssEvent, Event, FacilityControl, GainExperience, MetagameEvent,
    PlayerLogin, PlayerLogout, RawEvent, VehicleDestroy,
};
pub use subscription::EssSubscription;
pub use trigger::Trigger;
