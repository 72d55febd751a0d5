//! Demo Seeder (C11) — fixed canonical ids for deterministic integration
//! tests and the `/demo/*` HTTP fixtures.

use once_cell::sync::Lazy;
use uuid::Uuid;

use crate::domain::foundation::{DocumentId, DocumentVersionId, JobId, SectionId, TemplateId, TemplateVersionId};

fn parse(s: &str) -> Uuid {
    Uuid::parse_str(s).expect("demo id literal is a valid UUID")
}

pub static DEMO_TEMPLATE_ID: Lazy<TemplateId> = Lazy::new(|| TemplateId::from_uuid(parse("11111111-1111-1111-1111-111111111111")));
pub static DEMO_TEMPLATE_VERSION_ID: Lazy<TemplateVersionId> =
    Lazy::new(|| TemplateVersionId::from_uuid(parse("22222222-2222-2222-2222-222222222222")));
pub static DEMO_DOCUMENT_ID: Lazy<DocumentId> = Lazy::new(|| DocumentId::from_uuid(parse("33333333-3333-3333-3333-333333333333")));
pub static DEMO_DOCUMENT_VERSION_ID: Lazy<DocumentVersionId> =
    Lazy::new(|| DocumentVersionId::from_uuid(parse("44444444-4444-4444-4444-444444444444")));

/// Five fixed sections: two static, three dynamic, in `sequence_order`.
pub static DEMO_SECTION_IDS: Lazy<[SectionId; 5]> =
    Lazy::new(|| [SectionId::new(1), SectionId::new(2), SectionId::new(3), SectionId::new(4), SectionId::new(5)]);

/// Three fixed job ids, one per stage exercised by the happy-path scenario.
pub static DEMO_JOB_IDS: Lazy<[JobId; 3]> = Lazy::new(|| {
    [
        JobId::from_uuid(parse("66666666-6666-6666-6666-666666666001")),
        JobId::from_uuid(parse("66666666-6666-6666-6666-666666666002")),
        JobId::from_uuid(parse("66666666-6666-6666-6666-666666666003")),
    ]
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_ids_are_stable_across_calls() {
        assert_eq!(*DEMO_TEMPLATE_ID, *DEMO_TEMPLATE_ID);
        assert_eq!(DEMO_SECTION_IDS[0], SectionId::new(1));
        assert_eq!(DEMO_JOB_IDS.len(), 3);
    }

    #[test]
    fn demo_ids_are_pairwise_distinct() {
        assert_ne!(DEMO_TEMPLATE_ID.as_uuid(), DEMO_TEMPLATE_VERSION_ID.as_uuid());
        assert_ne!(DEMO_DOCUMENT_ID.as_uuid(), DEMO_DOCUMENT_VERSION_ID.as_uuid());
    }
}
