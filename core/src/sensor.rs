// Simulated DHT11 sensor and its in-memory store
//
// A background producer reads the simulator on a fixed interval, records the
// reading, and publishes it on the bus topics. History is bounded: only the
// most recent readings are retained.

use crate::bus::{SensorBus, SensorEvent};
use crate::config::SensorConfig;
use crate::rng::XorShift;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::debug;

/// One temperature/humidity reading, immutable once captured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Degrees Celsius
    pub temperature: f64,
    /// Relative humidity percent
    pub humidity: f64,
    pub captured_at: String,
    pub sensor_id: String,
}

/// Derived from store contents: offline until the first reading lands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorStatus {
    Online,
    Offline,
}

/// Aggregate over a window of readings, used as analysis input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSummary {
    pub total_readings: usize,
    pub latest_temperature: f64,
    pub latest_humidity: f64,
    pub avg_temperature: f64,
    pub avg_humidity: f64,
    pub window_start: String,
    pub window_end: String,
}

/// Simulates a DHT11 attached to a microcontroller: base values with bounded
/// jitter, clamped to the sensor's physical range (0-50 C, 20-95 %RH)
pub struct Dht11Simulator {
    sensor_id: String,
    base_temperature: f64,
    base_humidity: f64,
    temperature_variance: f64,
    humidity_variance: f64,
    rng: XorShift,
}

impl Dht11Simulator {
    pub fn new(sensor_id: impl Into<String>) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            base_temperature: 24.0,
            base_humidity: 60.0,
            temperature_variance: 5.0,
            humidity_variance: 15.0,
            rng: XorShift::from_time(),
        }
    }

    pub fn read(&mut self) -> SensorReading {
        let temperature = self.base_temperature
            + self
                .rng
                .range(-self.temperature_variance, self.temperature_variance);
        let humidity = self.base_humidity
            + self
                .rng
                .range(-self.humidity_variance, self.humidity_variance);
        SensorReading {
            temperature: round1(temperature.clamp(0.0, 50.0)),
            humidity: round1(humidity.clamp(20.0, 95.0)),
            captured_at: chrono::Utc::now().to_rfc3339(),
            sensor_id: self.sensor_id.clone(),
        }
    }
}

struct StoreInner {
    current: Option<SensorReading>,
    history: VecDeque<SensorReading>,
    last_update: Option<String>,
}

/// Current reading plus bounded history behind a lock
pub struct SensorStore {
    inner: RwLock<StoreInner>,
    history_cap: usize,
}

impl SensorStore {
    pub fn new(history_cap: usize) -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                current: None,
                history: VecDeque::new(),
                last_update: None,
            }),
            history_cap: history_cap.max(1),
        }
    }

    pub async fn record(&self, reading: SensorReading) {
        let mut inner = self.inner.write().await;
        inner.last_update = Some(reading.captured_at.clone());
        inner.current = Some(reading.clone());
        inner.history.push_back(reading);
        while inner.history.len() > self.history_cap {
            inner.history.pop_front();
        }
    }

    pub async fn current(&self) -> Option<SensorReading> {
        self.inner.read().await.current.clone()
    }

    /// The most recent `limit` readings, oldest first
    pub async fn recent(&self, limit: usize) -> Vec<SensorReading> {
        let inner = self.inner.read().await;
        let skip = inner.history.len().saturating_sub(limit);
        inner.history.iter().skip(skip).cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.history.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.history.is_empty()
    }

    pub async fn status(&self) -> SensorStatus {
        if self.inner.read().await.current.is_some() {
            SensorStatus::Online
        } else {
            SensorStatus::Offline
        }
    }

    pub async fn last_update(&self) -> Option<String> {
        self.inner.read().await.last_update.clone()
    }
}

/// Summarize a window of readings; `None` when the window is empty
pub fn summarize(readings: &[SensorReading]) -> Option<SensorSummary> {
    let first = readings.first()?;
    let last = readings.last()?;
    let n = readings.len() as f64;
    Some(SensorSummary {
        total_readings: readings.len(),
        latest_temperature: last.temperature,
        latest_humidity: last.humidity,
        avg_temperature: round1(readings.iter().map(|r| r.temperature).sum::<f64>() / n),
        avg_humidity: round1(readings.iter().map(|r| r.humidity).sum::<f64>() / n),
        window_start: first.captured_at.clone(),
        window_end: last.captured_at.clone(),
    })
}

/// Publish a reading on both sensor topics
pub fn publish_reading(bus: &SensorBus, config: &SensorConfig, reading: &SensorReading) {
    bus.publish(
        &config.temperature_topic,
        SensorEvent {
            topic: config.temperature_topic.clone(),
            sensor_id: reading.sensor_id.clone(),
            value: reading.temperature,
            unit: "celsius".to_string(),
            timestamp: reading.captured_at.clone(),
        },
    );
    bus.publish(
        &config.humidity_topic,
        SensorEvent {
            topic: config.humidity_topic.clone(),
            sensor_id: reading.sensor_id.clone(),
            value: reading.humidity,
            unit: "percent".to_string(),
            timestamp: reading.captured_at.clone(),
        },
    );
}

/// Spawn the periodic producer: read, record, publish, forever
pub fn spawn_producer(
    simulator: Arc<Mutex<Dht11Simulator>>,
    store: Arc<SensorStore>,
    bus: Arc<SensorBus>,
    config: SensorConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(config.interval_secs.max(1)));
        loop {
            interval.tick().await;
            let reading = simulator.lock().await.read();
            debug!(
                target: "sensor",
                temperature = reading.temperature,
                humidity = reading.humidity,
                "Produced reading"
            );
            store.record(reading.clone()).await;
            publish_reading(&bus, &config, &reading);
        }
    })
}

/// Take one reading immediately, outside the producer's cadence
pub async fn record_one(
    simulator: &Mutex<Dht11Simulator>,
    store: &SensorStore,
    bus: &SensorBus,
    config: &SensorConfig,
) -> SensorReading {
    let reading = simulator.lock().await.read();
    store.record(reading.clone()).await;
    publish_reading(bus, config, &reading);
    reading
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readings_stay_in_sensor_range() {
        let mut sim = Dht11Simulator::new("DHT11_TEST");
        for _ in 0..200 {
            let r = sim.read();
            assert!((0.0..=50.0).contains(&r.temperature));
            assert!((20.0..=95.0).contains(&r.humidity));
            assert_eq!(r.sensor_id, "DHT11_TEST");
        }
    }

    #[tokio::test]
    async fn history_is_bounded() {
        let store = SensorStore::new(5);
        let mut sim = Dht11Simulator::new("DHT11_TEST");
        for _ in 0..20 {
            store.record(sim.read()).await;
        }
        assert_eq!(store.len().await, 5);
        assert!(store.current().await.is_some());
    }

    #[tokio::test]
    async fn recent_returns_newest_readings() {
        let store = SensorStore::new(10);
        for i in 0..10 {
            store
                .record(SensorReading {
                    temperature: i as f64,
                    humidity: 50.0,
                    captured_at: format!("t{i}"),
                    sensor_id: "s".to_string(),
                })
                .await;
        }
        let recent = store.recent(3).await;
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].temperature, 7.0);
        assert_eq!(recent[2].temperature, 9.0);
    }

    #[test]
    fn summary_averages_window() {
        let readings: Vec<SensorReading> = (0..4)
            .map(|i| SensorReading {
                temperature: 20.0 + i as f64,
                humidity: 60.0,
                captured_at: format!("t{i}"),
                sensor_id: "s".to_string(),
            })
            .collect();
        let summary = summarize(&readings).unwrap();
        assert_eq!(summary.total_readings, 4);
        assert_eq!(summary.avg_temperature, 21.5);
        assert_eq!(summary.latest_temperature, 23.0);
        assert_eq!(summary.window_start, "t0");
        assert_eq!(summary.window_end, "t3");
    }

    #[test]
    fn summary_of_empty_window_is_none() {
        assert!(summarize(&[]).is_none());
    }
}
