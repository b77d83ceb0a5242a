//! genview Core - shared types and frame-thread plumbing
//!
//! This crate provides the foundational pieces used by every other genview crate:
//! - Transform and color types (math re-exported from glam)
//! - Frame clock, deadlines, and debouncing for single-threaded timers
//! - Non-blocking request handles for work running on background threads

pub mod pending;
pub mod time;
pub mod types;

pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
pub use pending::{ChannelClosed, PendingRequest, Responder};
pub use time::{millis, Deadline, Debounce, FrameClock};
pub use types::{Color, Transform};
