//! Demo domain — fixed fixture ids used by the Demo Seeder (C11).

mod demo_ids;

pub use demo_ids::{DEMO_DOCUMENT_ID, DEMO_DOCUMENT_VERSION_ID, DEMO_JOB_IDS, DEMO_SECTION_IDS, DEMO_TEMPLATE_ID, DEMO_TEMPLATE_VERSION_ID};
