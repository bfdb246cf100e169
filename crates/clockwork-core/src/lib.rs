//! clockwork-core library.
//!
//! Models several concurrent lines (processes), each an ordered sequence of
//! named events, and assigns every event a logical timestamp under a
//! pluggable discipline: Lamport scalars or per-line vectors. Events on
//! different lines can be linked by a causal relation, like a message
//! send/receive pair.
//!
//! ```
//! use clockwork_core::LamportClock;
//!
//! let mut clock = LamportClock::new(2);
//! clock.add_event(0, "send")?;
//! clock.add_event(1, "recv")?;
//! clock.add_relation("send", "recv")?;
//! assert_eq!(clock.event("recv").map(|e| e.time), Some(2));
//! # Ok::<(), clockwork_core::ClockError>(())
//! ```
//!
//! # Conventions
//!
//! - **Errors**: library operations return [`ClockError`]; configuration
//!   loading uses `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod adjust;
pub mod config;
pub mod engine;
pub mod error;
pub mod relation;
pub mod scenario;
pub mod store;
pub mod strategy;

pub use engine::{Clock, DEFAULT_LINE_COUNT, LamportClock, TimedEvent, VectorClock};
pub use error::{ClockError, ErrorCode, Result};
pub use store::Position;
pub use strategy::{Scalar, Strategy, StrategyKind, TimeOrder, Vector, VectorTime};
