//! # Broker Sandbox Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/integration/   # Flows across terminals, the responder and the log
//! └── benches/           # Matcher and fan-out benchmarks
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sandbox-tests
//! cargo bench -p sandbox-tests
//! ```

pub mod integration;
