//! Error types for cache operations
//!
//! This module defines all error types that can occur
//! during cache operations and backend interactions.

use thiserror::Error;

/// Cache system errors
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Redis connection error: {0}")]
    ConnectionError(#[from] redis::RedisError),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Wrong kind of value: {0}")]
    WrongType(String),

    #[error("Unexpected backend response: {0}")]
    UnexpectedResponse(String),

    #[error("Cache operation timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
