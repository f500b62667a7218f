//! Document viewer
//!
//! # Architecture
//!
//! ```text
//! ViewerHandle ──command──▶ ViewerRuntime ──▶ Viewer ──▶ Vec<Effect>
//!      ▲                        │   ▲                        │
//!      │                        │   └──── Completion ◀── spawned task
//!      └──── ViewerSnapshot ◀───┘ (watch)
//! ```
//!
//! [`Viewer`] holds all state and never blocks; [`ViewerRuntime`] runs its
//! effects and serializes every mutation through one task.

pub mod core;
pub mod effects;
pub mod runtime;
pub mod scale;
pub mod session;
pub mod thumbnails;

pub use self::core::{Panel, SearchSnapshot, ThumbnailEntry, Viewer, ViewerSnapshot};
pub use effects::{Completion, Effect};
pub use runtime::{RuntimeTimeouts, ViewerCommand, ViewerError, ViewerHandle, ViewerRuntime};
pub use scale::{fit_to_width, FitToWidth, ScaleFactor, MAX_SCALE, MIN_SCALE, ZOOM_STEP};
pub use session::{load_error_message, DocumentSession, LoadState, LoadStatus};
pub use thumbnails::{
    ThumbnailCache, ThumbnailConfig, ThumbnailKind, ThumbnailRequest, ThumbnailState, ThumbnailViewport,
};
