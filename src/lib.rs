//! think: pipe text into LLM providers from the command line.
//!
//! The binary in `main.rs` parses arguments and renders output; everything
//! else lives here:
//!
//! - [`config`]: the persisted per-user configuration store
//! - [`llm`]: the provider trait, the vendor implementations and the factory
//! - [`prompt`]: merging of the prompt argument with piped input
//! - [`processor`]: provider/key/model resolution and dispatch
//! - [`setup`]: interactive first-time configuration

pub mod config;
pub mod error;
pub mod llm;
pub mod logging;
pub mod processor;
pub mod prompt;
pub mod setup;
pub mod types;

pub use error::{Result, ThinkError};
