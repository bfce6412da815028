//! Always On Top E2E Test Harness
//!
//! This crate exercises the Always On Top viewer in two regimes:
//! - Driver-backed: the compiled app runs behind `tauri-driver`, which the
//!   harness locates, spawns, probes for readiness and tears down
//! - Isolation: the built frontend is loaded from disk with a mocked Tauri
//!   bridge installed before any page script runs
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    E2E Test Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Driver flow                                                │
//! │    locator::resolve(env, platform) -> DriverLocation        │
//! │    DriverProcess::spawn(config, files) -> DriverProcess     │
//! │    DriverProcess::await_ready()   (GET /status, backoff)    │
//! │    RemoteSession::run(steps)                                │
//! │    DriverProcess::teardown()      (also on Drop)            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Isolation flow                                             │
//! │    BridgeMock::new(fixture) -> init_script()                │
//! │    RemoteSession::with_bridge(mock).run(steps)              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestSpec (YAML)                                            │
//! │    ├── name, flow (isolation | driver), fixture             │
//! │    └── steps: navigate | click | wait | assert | evaluate   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod bridge;
pub mod config;
pub mod driver;
pub mod error;
pub mod fixture;
pub mod locator;
pub mod markers;
pub mod platform;
pub mod runner;
pub mod session;
pub mod spec;

pub use bridge::{BridgeMock, MockResponse, Settings};
pub use config::HarnessConfig;
pub use driver::{DriverConfig, DriverProcess, DriverState, Endpoint};
pub use error::{E2eError, E2eResult};
pub use fixture::FileProvider;
pub use locator::{resolve, DriverEnv, DriverLocation};
pub use platform::PlatformProfile;
pub use runner::TestRunner;
pub use spec::{Flow, TestSpec, TestStep};
