//! # olivetum-storage
//!
//! Chain-local persisted indices: the runtime block-period in effect after
//! each block, and the finalized-height watermark. Both survive restarts
//! and rewinds so difficulty calculation and runtime guards stay correct.

mod database;

pub use database::{IndexStore, StorageError, StorageResult};
