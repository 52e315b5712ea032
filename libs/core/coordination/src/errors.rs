// [libs/core/coordination/src/errors.rs]
use podcache_core_models::descriptor::DescriptorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinationError {
    #[error("coordination store unreachable: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("malformed pod descriptor: {0}")]
    Descriptor(#[from] DescriptorError),
}
