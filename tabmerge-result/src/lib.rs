//! Error types and result definitions for the tabmerge pipeline.
//!
//! Every crate in the workspace returns [`Result<T>`], whose error variant is the single
//! [`Error`] enum defined here. Failures propagate upward with `?` and are fatal for the run:
//! the pipeline is a one-shot batch job with no partial-result mode.
//!
//! # Error Categories
//!
//! - **Input errors** ([`Error::SourceRead`]): a source file is missing, malformed, or lacks a
//!   required column
//! - **Join errors** ([`Error::JoinKey`]): a join key assumed unique is duplicated
//! - **Narrowing errors** ([`Error::NarrowingOverflow`]): a value does not fit its narrowed type
//! - **Library errors** ([`Error::Io`], [`Error::Arrow`])
//! - **Caller errors** ([`Error::InvalidArgumentError`]) and bugs ([`Error::Internal`])

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
