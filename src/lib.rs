//! # tourgen
//!
//! Turns a flattened repository into a narrative CodeTour by delegating
//! code understanding to a chat-completion model.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────────────────────┐   ┌────────────┐
//! │  Snapshot  │──▶│ Prioritize → Chunk → Dispatch │──▶│  Validate  │
//! │ dir / JSON │   │   (windows of parallel LLM)  │   │  + Merge   │
//! └────────────┘   └──────────────────────────────┘   └─────┬──────┘
//!       │                                                   │
//!       └────────▶ Overview (LLM, else static) ─────────────┤
//!                                                           ▼
//!                                                    ┌────────────┐
//!                                                    │ .tour file │
//!                                                    └────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Snapshot and step types |
//! | [`error`] | Error taxonomy |
//! | [`priority`] | Entry-point ranking |
//! | [`partition`] | Fixed-size chunking |
//! | [`prompt`] | Prompt construction |
//! | [`decode`] | Model reply decoding |
//! | [`completion`] | Completion service abstraction |
//! | [`scheduler`] | Windowed parallel chunk dispatch |
//! | [`aggregate`] | Merge and trim chunk results |
//! | [`overview`] | Welcome step generation |
//! | [`validate`] | Step validation |
//! | [`pipeline`] | End-to-end orchestration |
//! | [`progress`] | Progress reporting |
//! | [`cancel`] | Cancellation signal |
//! | [`snapshot`] | Repository flattening front-end |
//! | [`tour`] | Tour assembly and persistence |

pub mod aggregate;
pub mod cancel;
pub mod completion;
pub mod config;
pub mod decode;
pub mod error;
pub mod models;
pub mod overview;
pub mod partition;
pub mod pipeline;
pub mod priority;
pub mod progress;
pub mod prompt;
pub mod scheduler;
pub mod snapshot;
pub mod tour;
pub mod validate;
