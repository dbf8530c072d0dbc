#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use servicevisor::{
    ContainerConfig, Event, EventKind, Listen, Service, ServiceContainer, ServiceError,
    StartContext, StopContext,
};

pub const WAIT: Duration = Duration::from_secs(5);

/// Shared, ordered log of callback invocations (`"start:a"`, `"stop:a"`).
pub type Log = Arc<Mutex<Vec<String>>>;

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Listener that keeps every event and lets tests wait for specific ones.
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
    notify: Notify,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Kinds of events recorded for `service`, in order, without listener bookkeeping.
    pub fn kinds(&self, service: &str) -> Vec<EventKind> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.service.as_deref() == Some(service))
            .filter(|e| {
                !matches!(
                    e.kind,
                    EventKind::ListenerAdded | EventKind::ListenerRemoved
                )
            })
            .map(|e| e.kind)
            .collect()
    }

    pub fn count(&self, service: &str, kind: EventKind) -> usize {
        self.kinds(service).iter().filter(|k| **k == kind).count()
    }

    /// Position of the first `kind` event of `service` in the global record.
    pub fn position(&self, service: &str, kind: EventKind) -> Option<usize> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .position(|e| e.kind == kind && e.service.as_deref() == Some(service))
    }

    pub fn reason(&self, service: &str, kind: EventKind) -> Option<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.kind == kind && e.service.as_deref() == Some(service))
            .and_then(|e| e.reason.as_deref().map(str::to_string))
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    /// Waits until `service` has emitted `kind` at least once.
    pub async fn expect(&self, service: &str, kind: EventKind) {
        let wait = async {
            loop {
                let notified = self.notify.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();
                if self.count(service, kind) > 0 {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(WAIT, wait)
            .await
            .unwrap_or_else(|_| panic!("{service} never emitted {kind:?}"));
    }
}

impl Listen for Recorder {
    fn on_event(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
        self.notify.notify_waiters();
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

/// Service that logs its callbacks and fails on request.
pub struct Probe {
    name: &'static str,
    log: Log,
    fail_once: AtomicBool,
    fail_always: bool,
    fail_stop: bool,
    panic_start: bool,
}

impl Probe {
    pub fn new(name: &'static str, log: &Log) -> Self {
        Self {
            name,
            log: log.clone(),
            fail_once: AtomicBool::new(false),
            fail_always: false,
            fail_stop: false,
            panic_start: false,
        }
    }

    pub fn failing_once(self) -> Self {
        self.fail_once.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_always = true;
        self
    }

    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panic_start = true;
        self
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl Service for Probe {
    async fn start(&self, _ctx: StartContext) -> Result<(), ServiceError> {
        self.log.lock().unwrap().push(format!("start:{}", self.name));
        if self.panic_start {
            panic!("{} exploded", self.name);
        }
        if self.fail_always || self.fail_once.swap(false, Ordering::SeqCst) {
            return Err(ServiceError::failed(format!("{} refused", self.name)));
        }
        Ok(())
    }

    async fn stop(&self, _ctx: StopContext) -> Result<(), ServiceError> {
        self.log.lock().unwrap().push(format!("stop:{}", self.name));
        if self.fail_stop {
            return Err(ServiceError::failed(format!("{} stuck", self.name)));
        }
        Ok(())
    }
}

/// Container with a container-wide recorder and a short grace period.
pub fn setup() -> (Arc<ServiceContainer>, Arc<Recorder>, Log) {
    let recorder = Recorder::new();
    let cfg = ContainerConfig {
        grace: WAIT,
        ..ContainerConfig::default()
    };
    let container = ServiceContainer::builder(cfg)
        .with_listener(recorder.clone())
        .build();
    (container, recorder, Log::default())
}

pub async fn settle(container: &ServiceContainer) {
    tokio::time::timeout(WAIT, container.await_stability())
        .await
        .expect("container did not settle");
}
