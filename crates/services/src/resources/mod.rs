mod cache;
mod orchestrator;

pub use cache::{CacheEntry, MAX_DOCUMENT_BYTES, RESOURCE_CACHE_TTL_SECS, ResourceCache};
pub use orchestrator::{FetchStrategy, ResourceFetch, ResourceFetchOrchestrator};
