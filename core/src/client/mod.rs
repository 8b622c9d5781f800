//! Provider Client Adapters
//!
//! Wire-format adapters for the configured AI backends. Each adapter
//! implements [`ProviderClient`], takes the credentials and mode of a
//! selected provider, performs one generation call against one model, and
//! decodes the response into the normalized
//! [`GenerationResult`](crate::generation::GenerationResult) shape.
//!
//! Adapters make exactly one attempt per call; the retry loop, model-chain
//! fallback, and skip rolls live in [`Generator`](crate::generation::Generator).

pub mod google;
pub mod openai;
pub mod traits;

pub use google::GoogleClient;
pub use openai::OpenAiClient;
pub use traits::ProviderClient;
