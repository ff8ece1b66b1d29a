//! Healthy Eating front-end smoke checks
//!
//! Two independent checkers:
//! - HTTP reachability: GET the three front-end routes and assert status and
//!   content type
//! - UI checklist: drive a headless browser through the pages and record a
//!   pass/fail verdict for each expected UI element
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 healthy-eating-smoke (Rust)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  http                                                       │
//! │    └── HttpChecker::check_all() -> [RouteOutcome]           │
//! │  ui                                                         │
//! │    ├── PlaywrightDriver::launch() -> impl PageDriver        │
//! │    ├── UiChecker::run() -> UiRun { CheckResults, ... }      │
//! │    └── UiReport::from_run() -> json | yaml                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Playwright bridge (node)                                   │
//! │    stdin  <- {"id":1,"op":"goto","url":"..."}               │
//! │    stdout -> {"id":1,"ok":true,"value":null}                │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod checklist;
pub mod driver;
pub mod error;
pub mod playwright;
pub mod reachability;
pub mod report;
pub mod results;
pub mod screenshots;

pub use checklist::{UiChecker, UiConfig, UiRun};
pub use driver::{PageDriver, Viewport};
pub use error::{E2eError, E2eResult};
pub use reachability::{HttpChecker, HttpConfig};
pub use results::{CheckName, CheckResult, CheckResults};
