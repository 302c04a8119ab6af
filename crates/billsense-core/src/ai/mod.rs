//! AI-backed invoice field extraction.
//!
//! The [`ExtractionOrchestrator`] sends document text to an OpenAI-compatible
//! provider through a [`Transport`], falling back across [`InvocationTier`]s
//! on malformed-request rejections, and normalizes whatever comes back with a
//! [`SchemaCoercer`].

mod coerce;
pub mod decode;
pub mod mock;
mod orchestrator;
pub mod schema;
pub mod tiers;
pub mod transport;

pub use coerce::{CoercionMode, SchemaCoercer};
pub use orchestrator::{ExtractionOrchestrator, PROVIDER_NAME};
pub use tiers::{InvocationTier, LegacyTier, PermissiveTier, StructuredTier, TierRequest};
pub use transport::{HttpTransport, ProviderFailure, Transport};
