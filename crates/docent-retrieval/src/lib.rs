//! Retrieval side of the grounded chat pipeline.
//!
//! A [`Retriever`] embeds the question, asks a [`VectorIndex`] for the nearest
//! passages inside one project's namespace, and a [`RelevanceFilter`] keeps
//! the ones scoring at or above the configured threshold.

pub mod error;
pub mod filter;
pub mod index;
pub mod memory;
pub mod pinecone;
pub mod retriever;
pub mod vector_math;

pub use error::RetrievalError;
pub use filter::RelevanceFilter;
pub use index::{IndexMatch, VectorIndex};
pub use memory::InMemoryVectorIndex;
pub use pinecone::PineconeIndex;
pub use retriever::{PassageRetriever, Retriever};
