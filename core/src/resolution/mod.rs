//! # TYPESAFE RESOLUTION
//!
//! **KEY -> OUTCOME, COMPUTED ONCE**
//!
//! The resolver filters a frozen registry through the type and qualifier matchers,
//! applies specialization and the alternative/priority tie-breaks and caches the
//! classified outcome per key.

pub mod cache;
pub mod key;
pub(crate) mod precedence;
pub mod resolver;

#[cfg(test)]
mod tests;

pub use cache::{CacheStats, ResolutionCache};
pub use key::{Resolution, ResolutionKey, ResolutionOutcome};
pub use resolver::TypeSafeResolver;
