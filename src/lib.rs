//! # ConcatWeave
//!
//! Streaming concatenation of storage objects, packaged as one step of a
//! workflow host.
//!
//! A run takes an ordered list of object references and an optional
//! separator, streams every object in turn into a scratch destination,
//! writes the separator between consecutive objects and publishes the
//! result as a new object.
//!
//! ## Components
//!
//! - **Input Resolver** ([`files`]): turns the `files` property, either a
//!   list or a template rendering to a JSON array, into [`Reference`]s
//! - **Stream Concatenator** ([`concat`]): copies objects with a fixed-size
//!   buffer and publishes the destination, or discards it on any failure
//! - **Concat step** ([`step`]): the host-facing entry point and its state
//!   machine
//!
//! Storage and template rendering belong to the host and are reached through
//! the [`Storage`] and [`Renderer`] traits.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use concatweave::{Concat, MemoryStorage, RunContext};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), concatweave::ConcatError> {
//! let storage = MemoryStorage::new();
//! storage.put("kestra://a", "hello")?;
//! storage.put("kestra://b", "world")?;
//!
//! let ctx = RunContext::new(Arc::new(storage.clone()));
//! let step = Concat::new(r#"["kestra://a","kestra://b"]"#).with_separator(" ");
//! let output = step.run(&ctx).await?;
//! assert_eq!(storage.get(output.uri.as_str())?.unwrap(), "hello world");
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

/// Streaming concatenation into a published object.
pub mod concat;
/// Step configuration.
pub mod config;
/// Per-run collaborators supplied by the host.
pub mod context;
/// Error types.
pub mod error;
/// Resolution of the `files` property.
pub mod files;
/// Storage object references.
pub mod reference;
/// Template rendering seam.
pub mod render;
/// Operation state machine.
pub mod state;
/// The concat step.
pub mod step;
/// Storage seam and bundled backends.
pub mod storage;

pub use concat::{ConcatSummary, Concatenator};
pub use config::ConcatConfig;
pub use context::RunContext;
pub use error::{ConcatError, ConcatResult};
pub use files::FileListSpec;
pub use reference::Reference;
pub use render::{PassthroughRenderer, RenderError, Renderer, VariableRenderer};
pub use state::{ConcatState, StateTracker};
pub use step::{Concat, ConcatOutput};
pub use storage::{LocalStorage, MemoryStorage, ObjectReader, SealedObject, Storage, TempObject};
