//! Regeneration Planner (C7) — decides per-section reuse vs. regenerate.
//!
//! Purely advisory: this module only computes a plan. Wiring the plan to
//! C4-C6 is the Pipeline Coordinator's job (see `application::pipeline`).

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DocumentId, DomainError, ErrorCode, SectionId, TemplateVersionId};

/// Which sections a regeneration request targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum RegenerationScope {
    Section { target_sections: Vec<SectionId> },
    Full,
    TemplateUpdate { new_template_version_id: TemplateVersionId },
}

/// How a `section`-scoped request decides reuse vs. regenerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegenerationStrategy {
    ReuseUnchanged,
    ForceAll,
}

/// A caller's request to regenerate some or all of a document's dynamic content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegenerationRequest {
    pub document_id: DocumentId,
    pub scope: RegenerationScope,
    pub strategy: RegenerationStrategy,
    pub force: bool,
}

impl RegenerationRequest {
    pub fn new(document_id: DocumentId, scope: RegenerationScope, strategy: RegenerationStrategy, force: bool) -> Self {
        Self { document_id, scope, strategy, force }
    }
}

/// The planner's output: which sections to regenerate, which to reuse, and
/// what version number the resulting pipeline run should intend to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegenerationPlan {
    pub regenerate: Vec<SectionId>,
    pub reuse: Vec<SectionId>,
    pub new_version_intent: i32,
}

/// Computes a regeneration plan.
///
/// `dynamic_section_ids` must be the dynamic sections of the *effective*
/// template version for this request (the document's current one, except
/// for `template_update`, where the caller passes the new version's
/// sections). `static_section_ids` belongs to the document's *current*
/// template version, used only to reject targeting a static section.
pub fn plan_regeneration(
    request: &RegenerationRequest,
    dynamic_section_ids: &[SectionId],
    static_section_ids: &[SectionId],
    previous_input_hashes: &HashMap<SectionId, String>,
    current_input_hashes: &HashMap<SectionId, String>,
    previous_version: i32,
) -> Result<RegenerationPlan, DomainError> {
    let new_version_intent = previous_version + 1;

    let (regenerate, reuse) = match &request.scope {
        RegenerationScope::Full => (dynamic_section_ids.to_vec(), Vec::new()),

        RegenerationScope::TemplateUpdate { .. } => (dynamic_section_ids.to_vec(), Vec::new()),

        RegenerationScope::Section { target_sections } => {
            if target_sections.is_empty() {
                return Err(DomainError::new(ErrorCode::ValidationFailed, "section-scoped regeneration requires a non-empty target set"));
            }
            for target in target_sections {
                if static_section_ids.contains(target) {
                    return Err(DomainError::new(ErrorCode::StaticSectionError, format!("section {target} is static and cannot be regenerated")));
                }
            }
            let targets: HashSet<SectionId> = target_sections.iter().copied().collect();
            let mut regenerate = Vec::new();
            let mut reuse = Vec::new();

            for &section_id in dynamic_section_ids {
                if !targets.contains(&section_id) {
                    reuse.push(section_id);
                    continue;
                }
                let should_regenerate = match request.strategy {
                    RegenerationStrategy::ForceAll => true,
                    RegenerationStrategy::ReuseUnchanged => {
                        request.force || previous_input_hashes.get(&section_id) != current_input_hashes.get(&section_id)
                    }
                };
                if should_regenerate {
                    regenerate.push(section_id);
                } else {
                    reuse.push(section_id);
                }
            }
            (regenerate, reuse)
        }
    };

    Ok(RegenerationPlan { regenerate, reuse, new_version_intent })
}


#[cfg(test)]
mod laws {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    const POOL: [i32; 6] = [1, 2, 3, 4, 5, 6];

    fn target_subset() -> impl Strategy<Value = Vec<SectionId>> {
        prop::collection::hash_set(0..POOL.len(), 1..=POOL.len())
            .prop_map(|indices| indices.into_iter().map(|i| SectionId::new(POOL[i])).collect())
    }

    proptest! {
        /// Every dynamic section appears in exactly one of `regenerate`/`reuse`, never both, never neither.
        #[test]
        fn section_scope_partitions_dynamic_sections_exactly(
            targets in target_subset(),
            force in any::<bool>(),
            strategy in prop_oneof![Just(RegenerationStrategy::ReuseUnchanged), Just(RegenerationStrategy::ForceAll)],
        ) {
            let dynamic: Vec<SectionId> = POOL.iter().map(|&n| SectionId::new(n)).collect();
            let request = RegenerationRequest::new(
                DocumentId::new(),
                RegenerationScope::Section { target_sections: targets },
                strategy,
                force,
            );
            let plan = plan_regeneration(&request, &dynamic, &[], &HashMap::new(), &HashMap::new(), 1).unwrap();

            let regenerate_set: BTreeSet<SectionId> = plan.regenerate.iter().copied().collect();
            let reuse_set: BTreeSet<SectionId> = plan.reuse.iter().copied().collect();
            prop_assert!(regenerate_set.is_disjoint(&reuse_set));
            prop_assert_eq!(plan.regenerate.len() + plan.reuse.len(), dynamic.len());
            let covered: BTreeSet<SectionId> = regenerate_set.union(&reuse_set).copied().collect();
            let expected: BTreeSet<SectionId> = dynamic.iter().copied().collect();
            prop_assert_eq!(covered, expected);
        }

        /// `Full` and `TemplateUpdate` scope always regenerate every dynamic section, regardless of hashes.
        #[test]
        fn full_and_template_update_scope_always_regenerate_everything(
            use_template_update in any::<bool>(),
            hashes_match in any::<bool>(),
        ) {
            let dynamic: Vec<SectionId> = POOL.iter().map(|&n| SectionId::new(n)).collect();
            let scope = if use_template_update {
                RegenerationScope::TemplateUpdate { new_template_version_id: TemplateVersionId::new() }
            } else {
                RegenerationScope::Full
            };
            let request = RegenerationRequest::new(DocumentId::new(), scope, RegenerationStrategy::ReuseUnchanged, false);
            let (previous, current) = if hashes_match {
                let h: HashMap<SectionId, String> = dynamic.iter().map(|&id| (id, "same".to_string())).collect();
                (h.clone(), h)
            } else {
                (HashMap::new(), HashMap::new())
            };
            let plan = plan_regeneration(&request, &dynamic, &[], &previous, &current, 1).unwrap();
            prop_assert_eq!(plan.regenerate, dynamic);
            prop_assert!(plan.reuse.is_empty());
        }

        /// Under `Section` scope with `force: true`, every targeted section regenerates regardless of hash equality.
        #[test]
        fn force_always_regenerates_targeted_sections_under_section_scope(targets in target_subset()) {
            let dynamic: Vec<SectionId> = POOL.iter().map(|&n| SectionId::new(n)).collect();
            let same_hashes: HashMap<SectionId, String> = dynamic.iter().map(|&id| (id, "unchanged".to_string())).collect();
            let request = RegenerationRequest::new(
                DocumentId::new(),
                RegenerationScope::Section { target_sections: targets.clone() },
                RegenerationStrategy::ReuseUnchanged,
                true,
            );
            let plan = plan_regeneration(&request, &dynamic, &[], &same_hashes, &same_hashes, 1).unwrap();
            let regenerate_set: BTreeSet<SectionId> = plan.regenerate.into_iter().collect();
            for target in &targets {
                prop_assert!(regenerate_set.contains(target));
            }
        }

        /// `new_version_intent` is always exactly `previous_version + 1`.
        #[test]
        fn new_version_intent_is_always_previous_plus_one(previous_version in 0i32..1000) {
            let dynamic: Vec<SectionId> = POOL.iter().map(|&n| SectionId::new(n)).collect();
            let request = RegenerationRequest::new(DocumentId::new(), RegenerationScope::Full, RegenerationStrategy::ForceAll, false);
            let plan = plan_regeneration(&request, &dynamic, &[], &HashMap::new(), &HashMap::new(), previous_version).unwrap();
            prop_assert_eq!(plan.new_version_intent, previous_version + 1);
        }
    }
}
