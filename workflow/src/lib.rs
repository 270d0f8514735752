//! # Workflow
//!
//! The task lifecycle around grading: tasks assigned to correctors and validators,
//! student results created when marks are entered, and the notifications those steps
//! produce.
//!
//! - [`transition`]: the pure state machine, [`apply_transition`] and [`plan_task`].
//! - [`store`]: the [`TaskStore`] seam and an in-memory implementation.
//! - [`engine`]: [`WorkflowEngine`], the async service most callers use.

pub mod effect;
pub mod engine;
pub mod error;
pub mod models;
pub mod notification;
pub mod store;
pub mod transition;

pub use effect::Effect;
pub use engine::WorkflowEngine;
pub use error::{WorkflowError, WorkflowResult};
pub use notification::{Notification, NotificationSettings};
pub use store::{CommitReceipt, InMemoryStore, TaskStore};
pub use transition::{
    apply_transition, plan_task, Transition, TransitionContext, TransitionOutcome,
};
