//! Wire format types for provider APIs
//!
//! Pure serde structs matching each provider's HTTP payloads. They only
//! exist at the adapter boundary and never leak into orchestration.

pub mod openai;
