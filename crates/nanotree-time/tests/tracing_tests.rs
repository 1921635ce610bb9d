#![forbid(unsafe_code)]

//! Tracing integration tests for the time scale.
//!
//!   cargo test -p nanotree-time --test tracing_tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use nanotree_time::{PrecisionTimeScale, Scale, TimeScaleError};

use tracing_subscriber::layer::SubscriberExt;

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    message: String,
    fields: HashMap<String, String>,
}

struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for EventCapture
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let mut fields: HashMap<String, String> = visitor.0.into_iter().collect();
        let message = fields.remove("message").unwrap_or_default();
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message,
            fields,
        });
    }
}

fn with_captured_events<F>(f: F) -> Vec<CapturedEvent>
where
    F: FnOnce(),
{
    let events = Arc::new(Mutex::new(Vec::new()));
    let layer = EventCapture {
        events: events.clone(),
    };
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().unwrap().clone();
    captured
}

const T0: i128 = 1_513_898_130_023_456_000;

#[test]
fn mode_switches_are_logged() {
    let events = with_captured_events(|| {
        let mut scale = PrecisionTimeScale::new();
        scale.set_domain([T0, T0 + 1_000]).unwrap();
        scale.set_domain([T0, T0 + 2_000]).unwrap();
        scale.set_domain([T0, T0 + 1_000_000_000]).unwrap();
    });
    let switches: Vec<&CapturedEvent> = events
        .iter()
        .filter(|e| e.message == "time scale mode changed")
        .collect();
    assert_eq!(switches.len(), 2);
    assert_eq!(switches[0].fields["high"], "true");
    assert_eq!(switches[0].fields["span"], "1000");
    assert_eq!(switches[1].fields["high"], "false");
    assert!(switches.iter().all(|e| e.level == tracing::Level::DEBUG));
}

#[test]
fn rejected_domain_logs_nothing() {
    let events = with_captured_events(|| {
        let mut scale = PrecisionTimeScale::new();
        let err = scale.set_domain([0, i128::MAX]).unwrap_err();
        assert!(matches!(err, TimeScaleError::OutOfRange { .. }));
    });
    assert!(events.is_empty());
}

#[test]
fn tick_overflow_is_returned_not_logged() {
    use nanotree_time::{CalendarInterval, CalendarUnit};

    let events = with_captured_events(|| {
        let mut scale = PrecisionTimeScale::new();
        // Every millisecond across a century is refused.
        scale
            .set_domain([0, 100 * 365 * 86_400_000_000_000])
            .unwrap();
        let explicit = scale.ticks_every(CalendarInterval::new(CalendarUnit::Millisecond, 1));
        assert!(matches!(explicit, Err(TimeScaleError::TooManyTicks { .. })));
        // Planned ticks never come close to the candidate limit.
        assert!(!scale.ticks(10).is_empty());
    });
    assert!(events.iter().all(|e| e.level != tracing::Level::WARN));
}
