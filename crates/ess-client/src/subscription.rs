//! ESS WebSocket subscription
//!
//! Connects to the push endpoint, sends one subscribe message per trigger
//! and forwards every event matched by a trigger. Heartbeats keep a map of
//! which event servers are online.

use std::collections::HashMap;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::config::EssConfig;
use crate::error::{EssError, Result};
use crate::event::{EssEvent, Event};
use crate::trigger::Trigger;

const MAX_RECONNECT_ATTEMPTS: u32 = 10;
const INITIAL_RECONNECT_DELAY: Duration = Duration::from_secs(1);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(60);

/// ESS subscription that connects and streams events
pub struct EssSubscription {
    config: EssConfig,
    triggers: Vec<Trigger>,
    event_tx: mpsc::Sender<EssEvent>,
    endpoint_status: HashMap<String, bool>,
}

impl EssSubscription {
    pub fn new(config: EssConfig, event_tx: mpsc::Sender<EssEvent>) -> Self {
        Self {
            config,
            triggers: Vec::new(),
            event_tx,
            endpoint_status: HashMap::new(),
        }
    }

    pub fn add_trigger(&mut self, trigger: Trigger) {
        debug!(trigger = %trigger.name(), "Adding trigger");
        self.triggers.push(trigger);
    }

    /// Remove every trigger with the given name, returning whether any existed
    pub fn remove_trigger(&mut self, name: &str) -> bool {
        let before = self.triggers.len();
        self.triggers.retain(|t| t.name() != name);
        self.triggers.len() != before
    }

    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    /// Last reported online state per event server, keyed by server name
    pub fn endpoint_status(&self) -> &HashMap<String, bool> {
        &self.endpoint_status
    }

    /// Start the subscription (runs until every trigger is gone or
    /// reconnects are exhausted)
    pub async fn run(&mut self) -> Result<()> {
        let mut reconnect_attempts = 0;

        while !self.triggers.is_empty() {
            match self.connect_and_stream(&mut reconnect_attempts).await {
                Ok(()) => {
                    info!("ESS connection closed cleanly");
                    break;
                }
                Err(e) => {
                    error!("ESS error: {}", e);
                    let _ = self.event_tx.send(EssEvent::Error(e.to_string())).await;
                    if !e.is_retryable() {
                        return Err(e);
                    }

                    reconnect_attempts += 1;
                    if reconnect_attempts >= MAX_RECONNECT_ATTEMPTS {
                        return Err(EssError::MaxReconnectAttempts);
                    }

                    let delay = reconnect_delay(reconnect_attempts);
                    warn!(
                        "Reconnecting in {:?} (attempt {}/{})",
                        delay, reconnect_attempts, MAX_RECONNECT_ATTEMPTS
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Ok(())
    }

    async fn connect_and_stream(&mut self, reconnect_attempts: &mut u32) -> Result<()> {
        let url = self.build_url();
        let endpoint = self.redacted_url();
        info!("Connecting to ESS: {}", endpoint);

        let (ws_stream, _) =
            connect_async(url.as_str())
                .await
                .map_err(|source| EssError::Connect {
                    endpoint,
                    source: Box::new(source),
                })?;
        let (mut write, mut read) = ws_stream.split();

        *reconnect_attempts = 0;
        let _ = self.event_tx.send(EssEvent::Connected).await;
        info!("ESS connection established");

        for trigger in &self.triggers {
            let message = trigger.subscription().map_err(|e| EssError::Subscribe {
                trigger: trigger.name(),
                reason: e.to_string(),
            })?;
            debug!(trigger = %trigger.name(), "Sending subscription: {}", message);
            write
                .send(Message::Text(message.into()))
                .await
                .map_err(|source| EssError::Send {
                    trigger: trigger.name(),
                    source: Box::new(source),
                })?;
        }

        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if let Err(e) = self.handle_message(&text).await {
                        debug!("Error processing message: {}", e);
                    }
                    if self.triggers.is_empty() {
                        info!("All triggers have been removed, closing websocket");
                        let _ = write.send(Message::Close(None)).await;
                        let _ = self.event_tx.send(EssEvent::Disconnected).await;
                        return Ok(());
                    }
                }
                Ok(Message::Close(_)) => {
                    info!("Received close frame");
                    let _ = self.event_tx.send(EssEvent::Disconnected).await;
                    return Err(EssError::ConnectionClosed);
                }
                Ok(_) => {
                    // Ignore binary, ping, pong messages
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    let _ = self.event_tx.send(EssEvent::Disconnected).await;
                    return Err(e.into());
                }
            }
        }

        let _ = self.event_tx.send(EssEvent::Disconnected).await;
        Err(EssError::ConnectionClosed)
    }

    fn build_url(&self) -> String {
        let separator = if self.config.endpoint.contains('?') { '&' } else { '?' };
        format!(
            "{}{}environment={}&service-id={}",
            self.config.endpoint, separator, self.config.environment, self.config.service_id
        )
    }

    fn redacted_url(&self) -> String {
        self.build_url()
            .replace(&self.config.service_id, "s:***")
    }

    async fn handle_message(&mut self, text: &str) -> Result<()> {
        let data: Value = serde_json::from_str(text)?;
        let service = data.get("service").and_then(Value::as_str);
        let kind = data.get("type").and_then(Value::as_str);

        match (service, kind) {
            (Some("event"), Some("serviceMessage")) => {
                let payload = data.get("payload").cloned().unwrap_or(Value::Null);
                match Event::from_payload(payload) {
                    Ok(event) => self.dispatch(event).await,
                    Err(e) => warn!("Ignoring unsupported payload: {}", e),
                }
            }
            (Some("event"), Some("heartbeat")) => {
                if let Some(online) = data.get("online").and_then(Value::as_object) {
                    self.endpoint_status = online
                        .iter()
                        .map(|(key, value)| (server_name(key), value.as_str() == Some("true")))
                        .collect();
                }
                debug!(servers = self.endpoint_status.len(), "Heartbeat received");
                let _ = self
                    .event_tx
                    .send(EssEvent::Heartbeat(self.endpoint_status.clone()))
                    .await;
            }
            (_, Some(kind)) if kind.starts_with("serviceStateChange") => {
                let server = data
                    .get("detail")
                    .and_then(Value::as_str)
                    .map(server_name)
                    .unwrap_or_default();
                let online = data.get("online").and_then(Value::as_str) == Some("true");
                info!(server = %server, online, "Service state change");
                self.endpoint_status.insert(server.clone(), online);
                let _ = self
                    .event_tx
                    .send(EssEvent::ServiceStateChanged { server, online })
                    .await;
            }
            (Some("push"), _) => debug!("Push service message: {}", text),
            _ if data.get("subscription").is_some() => debug!("Subscription echo: {}", text),
            _ => debug!("Ignoring message: {}", text),
        }

        Ok(())
    }

    async fn dispatch(&mut self, event: Event) {
        let matched: Vec<String> = self
            .triggers
            .iter()
            .filter(|t| t.check(&event))
            .map(Trigger::name)
            .collect();
        if matched.is_empty() {
            return;
        }

        debug!(event = event.event_name(), triggers = ?matched, "Dispatching event");
        self.triggers.retain(|t| {
            let fired = t.is_single_shot() && matched.contains(&t.name());
            if fired {
                info!(trigger = %t.name(), "Removing single-shot trigger");
            }
            !fired
        });
        let _ = self
            .event_tx
            .send(EssEvent::Event {
                triggers: matched,
                event,
            })
            .await;
    }
}

/// `EventServerEndpoint_Cobalt_13` -> `Cobalt`
fn server_name(key: &str) -> String {
    key.split('_').nth(1).unwrap_or(key).to_string()
}

fn reconnect_delay(attempt: u32) -> Duration {
    INITIAL_RECONNECT_DELAY
        .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
        .min(MAX_RECONNECT_DELAY)
}
