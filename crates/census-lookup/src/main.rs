//! Census lookup - PlanetSide 2 character lookup tool
//!
//! Looks a character up by name, resolves its faction, title and outfit
//! through the cached client and can then follow the character's logins,
//! logouts and deaths on the event stream.

mod config;
mod error;

use clap::Parser;
use ess_client::{EssEvent, EssSubscription, Event, Trigger};
use ps2_census::relation::{CharacterFaction, CharacterMembership, CharacterTitle, MemberOutfit};
use ps2_census::{Character, Client, EntityKind, Locale};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::config::load_config;
use crate::error::{LookupError, Result};

#[derive(Parser)]
#[command(about = "Look up a PlanetSide 2 character")]
struct Args {
    /// Character name (case-insensitive)
    name: String,

    /// Locale for localised names
    #[arg(long, default_value = "en")]
    locale: String,

    /// Follow the character on the event stream after the lookup
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::from_default_env().add_directive("census_lookup=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    let args = Args::parse();
    let locale: Locale = args.locale.parse()?;
    let config = load_config()?;

    let client = Client::new(config.census)?;
    if let Some((capacity, ttu)) = config.character_cache {
        client.set_policy(EntityKind::Character, capacity, ttu)?;
    }

    let Some(character) = client
        .get_by_name::<Character>(&args.name, &args.locale)
        .await?
    else {
        warn!(name = %args.name, "Character not found");
        return Ok(());
    };

    let faction = client.resolve_relationship(character.as_ref(), CharacterFaction)?;
    let title = client.resolve_relationship(character.as_ref(), CharacterTitle)?;
    let membership = client.resolve_relationship(character.as_ref(), CharacterMembership)?;
    let (faction, title, membership) =
        tokio::try_join!(faction.resolve(), title.resolve(), membership.resolve())?;

    let outfit = match membership {
        Some(member) => {
            client
                .resolve_relationship(member.as_ref(), MemberOutfit)?
                .resolve()
                .await?
        }
        None => None,
    };

    println!("{} ({})", character.name.first, character.character_id);
    if let Some(rank) = &character.battle_rank {
        println!("  Battle rank: {}", rank.value);
    }
    if let Some(faction) = &faction {
        println!("  Faction:     {}", faction.name.get(locale).unwrap_or("?"));
    }
    if let Some(title) = &title {
        println!("  Title:       {}", title.name.get(locale).unwrap_or("?"));
    }
    if let Some(outfit) = &outfit {
        println!("  Outfit:      [{}] {}", outfit.alias, outfit.name);
    }

    for kind in EntityKind::ALL {
        let stats = client.cache_stats(kind);
        info!(
            kind = %kind,
            entries = stats.entries,
            capacity = stats.capacity,
            hits = stats.hits,
            misses = stats.misses,
            "Cache stats"
        );
    }

    if args.watch {
        watch(&client, config.ess, character.character_id, locale).await?;
    }

    Ok(())
}

async fn watch(
    client: &Client,
    config: ess_client::EssConfig,
    character_id: u64,
    locale: Locale,
) -> Result<()> {
    let (event_tx, mut event_rx) = mpsc::channel::<EssEvent>(1000);

    let mut subscription = EssSubscription::new(config, event_tx);
    subscription.add_trigger(
        Trigger::new("PlayerLogin")
            .event("PlayerLogout")
            .event("Death")
            .characters([character_id])
            .named("watch"),
    );
    let stream = tokio::spawn(async move { subscription.run().await });

    while let Some(message) = event_rx.recv().await {
        match message {
            EssEvent::Event { event, .. } => {
                if let Err(e) = report(client, &event, locale).await {
                    error!("Failed to resolve event: {}", e);
                }
            }
            EssEvent::Connected => info!("Connected to event stream"),
            EssEvent::Disconnected => warn!("Disconnected from event stream"),
            EssEvent::Error(e) => error!("Event stream error: {}", e),
            EssEvent::Heartbeat(_) | EssEvent::ServiceStateChanged { .. } => {}
        }
    }

    match stream.await {
        Ok(result) => result.map_err(LookupError::from),
        Err(e) => Err(LookupError::Config(format!("event stream task failed: {}", e))),
    }
}

async fn report(client: &Client, event: &Event, locale: Locale) -> Result<()> {
    let world = match event.world_id() {
        Some(id) => client.world_proxy(id).resolve().await?,
        None => None,
    };
    let world = world
        .as_ref()
        .and_then(|w| w.name.get(locale))
        .unwrap_or("unknown world")
        .to_string();

    match event {
        Event::Death(death) => {
            let attacker = client
                .character_proxy(death.attacker_character_id)
                .resolve()
                .await?;
            let attacker = attacker
                .as_ref()
                .map(|c| c.name.first.as_str())
                .unwrap_or("the environment");
            println!("[{}] {} killed by {}", world, death.character_id, attacker);
        }
        other => {
            let character = match other.character_id() {
                Some(id) => client.character_proxy(id).resolve().await?,
                None => None,
            };
            let name = character
                .as_ref()
                .map(|c| c.name.first.as_str())
                .unwrap_or("?");
            println!("[{}] {}: {}", world, other.event_name(), name);
        }
    }
    Ok(())
}
