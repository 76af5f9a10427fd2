// Smart-home agent driven by the intent rule list
//
// Holds a small simulated home state and answers AgentMessage queries about
// it. The update-temperature intent is the only mutation.

use crate::intent::{IntentKind, IntentRouter};
use crate::message::AgentMessage;
use crate::rng::XorShift;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeState {
    /// Degrees Celsius
    pub temperature: f64,
    /// "on" / "off"
    pub light: String,
}

impl Default for HomeState {
    fn default() -> Self {
        Self {
            temperature: 22.5,
            light: "off".to_string(),
        }
    }
}

pub struct HomeAgent {
    name: String,
    state: RwLock<HomeState>,
    router: IntentRouter,
    rng: Mutex<XorShift>,
}

impl HomeAgent {
    pub fn new(name: impl Into<String>, initial_state: HomeState) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(initial_state),
            router: IntentRouter::smart_home_defaults(),
            rng: Mutex::new(XorShift::from_time()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn state(&self) -> HomeState {
        self.state.read().await.clone()
    }

    /// Answer one message; always replies, unknown queries get the fallback
    pub async fn handle(&self, message: &AgentMessage) -> AgentMessage {
        let intent = self.router.detect(&message.text);
        debug!(target: "home", sender = %message.sender, intent = ?intent, "Handling message");

        let text = match intent {
            Some(IntentKind::UpdateTemperature) => {
                let new_temp = {
                    let mut rng = self.rng.lock().await;
                    (rng.range(20.0, 30.0) * 10.0).round() / 10.0
                };
                self.state.write().await.temperature = new_temp;
                format!("Simulated temperature has been updated to {new_temp}\u{b0}C.")
            }
            Some(IntentKind::Temperature) => {
                let state = self.state.read().await;
                format!(
                    "The current simulated temperature is {}\u{b0}C.",
                    state.temperature
                )
            }
            Some(IntentKind::Lights) => {
                let state = self.state.read().await;
                format!("The lights are currently {}.", state.light)
            }
            Some(IntentKind::HomeStatus) => {
                let state = self.state.read().await;
                format!(
                    "The current smart home status is: temperature {}\u{b0}C, lights {}.",
                    state.temperature, state.light
                )
            }
            None => {
                "I'm sorry, I don't understand that query about the smart home.".to_string()
            }
        };

        AgentMessage::reply_to(message, self.name.clone(), text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    #[tokio::test]
    async fn answers_temperature_query() {
        let agent = HomeAgent::new("home", HomeState::default());
        let msg = AgentMessage::user("what's the temperature inside?", "client", "home");
        let reply = agent.handle(&msg).await;
        assert_eq!(reply.role, Role::Agent);
        assert_eq!(reply.recipient, "client");
        assert!(reply.text.contains("22.5"));
    }

    #[tokio::test]
    async fn update_intent_mutates_state() {
        let agent = HomeAgent::new("home", HomeState::default());
        let msg = AgentMessage::user("update temperature please", "client", "home");
        let reply = agent.handle(&msg).await;
        assert!(reply.text.contains("updated"));
        let state = agent.state().await;
        assert!((20.0..=30.0).contains(&state.temperature));
    }

    #[tokio::test]
    async fn unknown_query_gets_fallback() {
        let agent = HomeAgent::new("home", HomeState::default());
        let msg = AgentMessage::user("sing me a song", "client", "home");
        let reply = agent.handle(&msg).await;
        assert!(reply.text.contains("don't understand"));
    }
}
