//! Switcher Core - Live Output Routing for Broadcast Overlays
//!
//! This crate decides, for each of up to four independent video outputs,
//! which single piece of interactive content (an audience poll or a
//! moderated Q&A question) is on air right now, in which layout, and how
//! it enters and leaves the screen. It is completely independent of any
//! rendering framework: it can drive an HTML overlay, a hardware keyer,
//! or run headless for testing.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Operator Console                        │
//! │        go live / assign / cue / play / stop / next           │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │ fire-and-forget writes
//! ┌──────────────────────────────┴───────────────────────────────┐
//! │                     Content Repository                       │
//! │            polls + Q&A items, authoring order                │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │ cadenced reads (1s / 2s)
//! ┌──────────────────────────────┴───────────────────────────────┐
//! │              Output Surfaces (one per output)                │
//! │  ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐   │
//! │  │ Output 1 │   │ Output 2 │   │ Output 3 │   │ Output 4 │   │
//! │  │ sync loop│   │ sync loop│   │ sync loop│   │ sync loop│   │
//! │  │ resolver │   │ resolver │   │ resolver │   │ resolver │   │
//! │  │ animator │   │ animator │   │ animator │   │ animator │   │
//! │  └──────────┘   └──────────┘   └──────────┘   └──────────┘   │
//! │        each owns an isolated RenderState for its renderer    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`OutputSurface`]: The per-output synchronization loop
//! - [`OperatorConsole`]: The control facade a UI drives
//! - [`ContentRepository`]: Trait for the backing content store
//! - [`resolve`]: The pure single-winner content resolver
//! - [`Orchestrator`]: Two-phase enter/exit transition sequencer
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use switcher_core::{
//!     EngineConfig, InMemoryRepository, OperatorConsole, OutputIndex, OutputSurface,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let repository = Arc::new(InMemoryRepository::new());
//!     let config = EngineConfig::default();
//!
//!     // One surface per video output.
//!     let handles: Vec<_> = OutputIndex::ALL
//!         .into_iter()
//!         .map(|output| {
//!             OutputSurface::new(Arc::clone(&repository) as _, output, config.clone()).spawn()
//!         })
//!         .collect();
//!
//!     // The operator UI drives the console; outputs follow the store.
//!     let console = OperatorConsole::new(repository, config);
//!
//!     for handle in handles {
//!         handle.shutdown().await;
//!     }
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`content`]: Polls, Q&A items, layouts, and output assignments
//! - [`resolver`]: Pure single-winner resolution per output
//! - [`lifecycle`]: The Q&A queue state machine
//! - [`repository`]: Content store trait and in-memory implementation
//! - [`sync`]: Cadenced fetch, diff classification, fail-open caching
//! - [`animation`]: Two-phase enter/exit transition sequencing
//! - [`surface`]: The per-output synchronization loop
//! - [`console`]: Operator control facade
//! - [`config`]: TOML configuration file support
//!
//! # No Renderer Dependencies
//!
//! This crate has **zero** dependencies on any graphics or web stack. A
//! renderer subscribes to a surface's [`RenderState`] and draws whatever
//! it says.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod animation;
pub mod config;
pub mod console;
pub mod content;
pub mod lifecycle;
pub mod repository;
pub mod resolver;
pub mod surface;
pub mod sync;

// Re-exports for convenience
pub use animation::{
    AnimationConfig, FrameClock, Orchestrator, RenderState, TimerFrameClock, Transition,
    TransitionPhase, TransitionStyle, BACKGROUND_STAGGER_MS, EXIT_DURATION_MS,
};
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigSource,
    EngineConfig, SwitcherToml,
};
pub use console::OperatorConsole;
pub use content::{
    ContentId, LayoutVariant, OutputAssignment, OutputIndex, Poll, PollOption, QaItem, QaQuestion,
    QaSession,
};
pub use repository::{ContentRepository, InMemoryRepository, RepositoryError};
pub use resolver::{resolve, LiveSnapshot, ResolvedContent, ResolvedItem};
pub use surface::{OutputSurface, SurfaceHandle};
pub use sync::{classify, SyncChange, SyncState};
