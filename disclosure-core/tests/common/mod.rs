//! Shared fixtures for integration tests

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use disclosure_core::{
    Clock, Config, InMemoryGateway, ManualClock, Principal, SealedPayload, WorkflowEngine,
};
use std::sync::Arc;

/// Engine plus handles on its clock and gateway
pub struct Harness {
    pub engine: WorkflowEngine,
    pub clock: Arc<ManualClock>,
    pub gateway: Arc<InMemoryGateway>,
    pub owner: Principal,
    pub regulator: Principal,
}

impl Harness {
    /// Current time on the harness clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

/// Install a test subscriber once; honours RUST_LOG
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Test configuration: short cooldown, default periods
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.owner = Principal::new("owner");
    config.regulator = Principal::new("regulator-r");
    config.rate_limit.cooldown_seconds = 60;
    config
}

pub fn harness() -> Harness {
    harness_with(test_config())
}

pub fn harness_with(config: Config) -> Harness {
    init_tracing();

    let clock = Arc::new(ManualClock::default());
    let gateway = Arc::new(InMemoryGateway::new());
    let owner = config.owner.clone();
    let regulator = config.regulator.clone();
    let engine = WorkflowEngine::new(config, clock.clone(), gateway.clone()).unwrap();

    Harness {
        engine,
        clock,
        gateway,
        owner,
        regulator,
    }
}

/// Stand-in for the external sealing scheme: the core only sees bytes
pub fn seal(amount: u64, count: u32) -> SealedPayload {
    let plain = serde_json::to_vec(&serde_json::json!({
        "amount": amount,
        "count": count,
    }))
    .unwrap();
    let key = blake3::hash(b"test-sealing-key");
    let sealed: Vec<u8> = plain
        .iter()
        .zip(key.as_bytes().iter().cycle())
        .map(|(byte, k)| byte ^ k)
        .collect();
    SealedPayload::new(sealed)
}
