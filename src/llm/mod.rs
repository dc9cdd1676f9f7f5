pub mod gateway;

pub use gateway::{ContentPart, LlmClient, LlmError, LlmMessage, LlmResponse};
