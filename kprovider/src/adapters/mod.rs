#[cfg(feature = "provider-gemini")]
pub mod gemini;

#[cfg(feature = "provider-ollama")]
pub mod ollama;
