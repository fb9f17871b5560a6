//! API module for shared HTTP contract types
//!
//! The wire contract between the sample server (riffle-sv) and the session
//! engine (riffle-se). Field names are camelCase on the wire; both sides
//! must agree, so the types live here rather than in either service.

pub mod types;

pub use types::{
    ArchiveRequest, ArchiveResponse, AuthStatusResponse, ErrorResponse, HealthResponse,
    SampleResponse,
};
