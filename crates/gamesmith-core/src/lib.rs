//! Core of Gamesmith: turn a game description into a self-contained HTML5
//! game via a chat-completion endpoint.
//!
//! ## Architecture
//!
//! ```text
//! prompt ──> GenerationRequestFlow ──> CompletionTransport ──> endpoint
//!                 │        │
//!                 │        └── ProgressSimulator ──┐
//!                 │                                 v
//!                 └──────── status / progress ──> StatusSink
//!                 │
//!                 └──> ExtractedCode ──> render_sandboxed_page
//! ```
//!
//! ## Modules
//!
//! - [`flow`] -- The timed, retrying generation flow.
//! - [`transport`] -- The per-attempt network seam and its HTTP implementation.
//! - [`request`] -- Instruction template and outbound request body.
//! - [`response`] -- Success and error body decoding.
//! - [`fence`] -- Code-fence marker removal.
//! - [`progress`] -- Cancellable progress simulation.
//! - [`status`] -- Status values and the sink trait.
//! - [`display`] -- Sandboxed host page for generated output.
//! - [`config`] -- Layered configuration.
//! - [`error`] -- Error types.

pub mod config;
pub mod display;
pub mod error;
pub mod fence;
pub mod flow;
pub mod progress;
pub mod request;
pub mod response;
pub mod status;
pub mod transport;

// Re-export the most commonly used types at the crate root.
pub use config::GeneratorConfig;
pub use display::render_sandboxed_page;
pub use error::{GenerationError, Result};
pub use fence::strip_code_fences;
pub use flow::{
    AttemptStatus, ExtractedCode, GenerationAttemptState, GenerationRequestFlow, GenerationResult,
};
pub use progress::{ProgressMeter, ProgressSimulator};
pub use request::GenerationRequest;
pub use status::{FlowStatus, StatusSink, TracingSink};
pub use transport::{CompletionTransport, HttpTransport, RawResponse, TransportError};

/// Re-exported so callers can cancel a run without depending on
/// `tokio-util` directly.
pub use tokio_util::sync::CancellationToken;
