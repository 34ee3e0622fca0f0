//! Chunk retrieval

pub mod retriever;

pub use retriever::Retriever;
