//! Request and Response models for the profiles and cache admin API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{InvalidateRequest, ListParams, ProfileRequest};
pub use responses::{
    FlushResponse, HealthResponse, InvalidateResponse, KeysResponse, Profile, StatsResponse,
};
