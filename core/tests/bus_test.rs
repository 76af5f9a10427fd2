/// Sensor bus delivery, bounding and disconnect semantics
use ambient_core::bus::{SensorBus, SensorEvent};

fn event(topic: &str, value: f64) -> SensorEvent {
    SensorEvent {
        topic: topic.to_string(),
        sensor_id: "DHT11_TEST".to_string(),
        value,
        unit: "celsius".to_string(),
        timestamp: "2025-01-01T00:00:00Z".to_string(),
    }
}

#[tokio::test]
async fn subscriber_receives_published_events() {
    let bus = SensorBus::new(8);
    let (_id, mut rx) = bus.subscribe(&["sensor/temperature"]);

    let delivered = bus.publish("sensor/temperature", event("sensor/temperature", 21.5));
    assert_eq!(delivered, 1);

    let received = rx.recv().await.unwrap();
    assert_eq!(received.value, 21.5);
    assert_eq!(received.topic, "sensor/temperature");
}

#[tokio::test]
async fn one_channel_can_watch_several_topics() {
    let bus = SensorBus::new(8);
    let (_id, mut rx) = bus.subscribe(&["sensor/temperature", "sensor/humidity"]);

    bus.publish("sensor/temperature", event("sensor/temperature", 22.0));
    bus.publish("sensor/humidity", event("sensor/humidity", 55.0));

    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    assert_eq!(first.topic, "sensor/temperature");
    assert_eq!(second.topic, "sensor/humidity");
}

#[tokio::test]
async fn events_on_other_topics_are_not_delivered() {
    let bus = SensorBus::new(8);
    let (_id, mut rx) = bus.subscribe(&["sensor/temperature"]);

    let delivered = bus.publish("sensor/humidity", event("sensor/humidity", 50.0));
    assert_eq!(delivered, 0);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn dropped_subscriber_is_pruned_after_one_publish() {
    let bus = SensorBus::new(8);
    let (_id, rx) = bus.subscribe(&["sensor/temperature"]);
    assert_eq!(bus.subscriber_count("sensor/temperature"), 1);

    // Client disconnects
    drop(rx);

    // The first publish after the disconnect finds the closed channel,
    // counts the event as dropped and prunes the subscription
    let delivered = bus.publish("sensor/temperature", event("sensor/temperature", 20.0));
    assert_eq!(delivered, 0);
    assert_eq!(bus.subscriber_count("sensor/temperature"), 0);

    let stats = bus.stats("sensor/temperature").unwrap();
    assert_eq!(stats.dropped_events, 1);
    assert_eq!(stats.active_subscriptions, 0);

    // Later publishes see no subscriber at all
    bus.publish("sensor/temperature", event("sensor/temperature", 20.5));
    let stats = bus.stats("sensor/temperature").unwrap();
    assert_eq!(stats.total_published, 2);
    assert_eq!(stats.total_delivered, 0);
}

#[tokio::test]
async fn slow_subscriber_drops_instead_of_blocking() {
    let bus = SensorBus::new(2);
    let (_id, mut rx) = bus.subscribe(&["sensor/temperature"]);

    // Fill the bounded queue without consuming
    for i in 0..5 {
        bus.publish("sensor/temperature", event("sensor/temperature", i as f64));
    }

    let stats = bus.stats("sensor/temperature").unwrap();
    assert_eq!(stats.total_published, 5);
    assert_eq!(stats.total_delivered, 2);
    assert_eq!(stats.dropped_events, 3);

    // The retained events are the oldest two
    assert_eq!(rx.recv().await.unwrap().value, 0.0);
    assert_eq!(rx.recv().await.unwrap().value, 1.0);
}

#[tokio::test]
async fn unsubscribe_removes_all_topic_registrations() {
    let bus = SensorBus::new(8);
    let (id, mut rx) = bus.subscribe(&["sensor/temperature", "sensor/humidity"]);

    bus.unsubscribe(&id);
    assert_eq!(bus.subscriber_count("sensor/temperature"), 0);
    assert_eq!(bus.subscriber_count("sensor/humidity"), 0);

    bus.publish("sensor/temperature", event("sensor/temperature", 20.0));
    assert!(rx.try_recv().is_err());
}
