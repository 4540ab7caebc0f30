//! Document classification and field validation.
//!
//! Both stages are pure functions over already-extracted text:
//! [`classify`] picks a [`DocumentType`](crate::models::document::DocumentType)
//! by keyword, [`validate`] pulls the type-specific fields out with regexes.

mod classifier;
mod validator;
pub mod patterns;

pub use classifier::{classify, ClassificationRule, CLASSIFICATION_RULES};
pub use validator::validate;
