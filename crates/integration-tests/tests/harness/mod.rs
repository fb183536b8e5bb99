#![allow(dead_code)]

pub mod executor;
pub mod mock_llm;
pub mod scripted;
