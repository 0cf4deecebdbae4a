// src/services/mod.rs
pub mod assistant;
pub mod chunker;
pub mod knowledge_store;
pub mod llm;
pub mod metrics_manager;
pub mod session_manager;
