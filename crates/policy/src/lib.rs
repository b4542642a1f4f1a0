//! Zone classification, domain/URL validation, and the ordered
//! security-policy catalogue — the three pieces that decide what an
//! invocation's target means before a handler consults auth state.

pub mod catalogue;
pub mod domains;
pub mod zone;

pub use catalogue::{PolicyCatalogue, PolicyTarget};
pub use domains::{DomainDecision, DomainList, DomainValidator, DomainVerdict};
pub use zone::ZoneClassifier;
