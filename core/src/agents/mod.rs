// Agent services composing fetchers, caches and the analyzer
//
// Each agent is an explicitly constructed service object holding its own
// clients; nothing here is process-global.

mod gateway;
mod home_agent;
mod iot_agent;
mod weather_agent;

pub use gateway::{CombinedResponse, Gateway};
pub use home_agent::{HomeAgent, HomeState};
pub use iot_agent::{IotAgent, IotAnalysis};
pub use weather_agent::{WeatherAgent, WeatherAnalysis};
