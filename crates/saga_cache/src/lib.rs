//! Scene caching for generated world descriptions.
//!
//! Cached scenes are keyed by world, stage and location. Whether a cached
//! scene is served instead of generating a fresh one is decided by a
//! [`ReusePolicy`].

mod policy;
mod scene_cache;

pub use policy::{Always, FixedProbability, Never, ReusePolicy};
pub use scene_cache::{CacheConfig, CacheEntry, SceneCache, SceneKey};
