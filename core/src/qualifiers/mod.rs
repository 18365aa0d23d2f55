pub mod matcher;
pub mod types;

pub use matcher::QualifierMatcher;
pub use types::{MemberValue, Qualifier, QualifierMember, QualifierSet, ANY, DEFAULT, NAMED};
