//! Crate-level scenarios spanning several modules.

mod clinical_protocol;
