//! docshape - recursive document-shape validation for document stores
//!
//! Schemas describe which fields a document must carry and what each
//! field may hold: a scalar type, a numeric range, an array of scalars, or
//! an array of subdocuments validated against their own schema. Validation
//! reports every violation with the path that produced it.

pub mod cli;
pub mod observability;
pub mod schema;
