//! Plan composition
//!
//! Deterministic selection of which sites get a PM in the target week, and
//! contract validation for suggestions produced by the external reasoning
//! service. Overdue sites come first, fill-in picks favour sites that have not
//! been scheduled recently, and a site already planned for the week is never
//! suggested again.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::sites::Site;
use crate::domain::weekly_pm::WeekId;
use crate::planning::PlanningError;

/// One suggested assignment: the site and its currently responsible
/// technician. Planning never reassigns sites.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuggestedPm {
    pub site_id: Uuid,
    pub technician_id: Option<Uuid>,
}

/// Outcome of a planning run. `reasoning` is free text; the deterministic
/// composer emits a structured summary, the remote service emits prose.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSuggestion {
    pub suggested_pms: Vec<SuggestedPm>,
    pub reasoning: String,
}

/// Snapshot of everything the composer may consult for one target week.
#[derive(Debug)]
pub struct ComposeContext<'a> {
    /// Output of the overdue detector, in site-collection order.
    pub overdue: &'a [Site],
    pub all_sites: &'a [Site],
    /// Sites that already have a PM in the target week.
    pub scheduled_site_ids: &'a HashSet<Uuid>,
    /// Most recent week each site was ever scheduled, from the full PM
    /// collection. Sites absent here have never been scheduled.
    pub last_scheduled: &'a HashMap<Uuid, WeekId>,
    pub target_site_count: usize,
}

/// Compose a plan for the week.
///
/// Every overdue site not yet scheduled is taken first, up to the target
/// count. Remaining slots are filled from the site collection ordered by last
/// scheduled week ascending with never-scheduled sites first; ties keep the
/// input order (stable sort), so the result is fully deterministic.
pub fn compose(ctx: &ComposeContext<'_>) -> PlanSuggestion {
    let mut picked: Vec<SuggestedPm> = Vec::new();
    let mut picked_ids: HashSet<Uuid> = HashSet::new();

    for site in ctx.overdue {
        if picked.len() == ctx.target_site_count {
            break;
        }
        if ctx.scheduled_site_ids.contains(&site.id) || !picked_ids.insert(site.id) {
            continue;
        }
        picked.push(SuggestedPm {
            site_id: site.id,
            technician_id: site.technician_id,
        });
    }
    let overdue_count = picked.len();

    if picked.len() < ctx.target_site_count {
        let mut fillers: Vec<&Site> = ctx
            .all_sites
            .iter()
            .filter(|s| !ctx.scheduled_site_ids.contains(&s.id) && !picked_ids.contains(&s.id))
            .collect();
        fillers.sort_by_key(|s| ctx.last_scheduled.get(&s.id).copied());

        for site in fillers {
            if picked.len() == ctx.target_site_count {
                break;
            }
            picked_ids.insert(site.id);
            picked.push(SuggestedPm {
                site_id: site.id,
                technician_id: site.technician_id,
            });
        }
    }

    let filler_count = picked.len() - overdue_count;
    let reasoning = format!(
        "Selected {} of up to {} sites: {} overdue in the current half-year, \
         {} fill-in picks ordered by least recently scheduled.",
        picked.len(),
        ctx.target_site_count,
        overdue_count,
        filler_count
    );

    PlanSuggestion {
        suggested_pms: picked,
        reasoning,
    }
}

/// Validate a suggestion against the planning contract.
///
/// Applied to every suggestion before it can be shown or persisted, whether
/// it came from the deterministic composer or the external reasoning service.
/// Any violation fails the whole planning operation.
pub fn validate_suggestion(
    suggestion: &PlanSuggestion,
    ctx: &ComposeContext<'_>,
) -> Result<(), PlanningError> {
    let contract = |msg: String| Err(PlanningError::Contract(msg));

    if suggestion.suggested_pms.len() > ctx.target_site_count {
        return contract(format!(
            "{} entries suggested, target is {}",
            suggestion.suggested_pms.len(),
            ctx.target_site_count
        ));
    }

    let sites_by_id: HashMap<Uuid, &Site> = ctx.all_sites.iter().map(|s| (s.id, s)).collect();
    let mut seen: HashSet<Uuid> = HashSet::new();

    for pm in &suggestion.suggested_pms {
        if !seen.insert(pm.site_id) {
            return contract(format!("site {} suggested twice", pm.site_id));
        }
        if ctx.scheduled_site_ids.contains(&pm.site_id) {
            return contract(format!(
                "site {} already has a PM in the target week",
                pm.site_id
            ));
        }
        let site = match sites_by_id.get(&pm.site_id) {
            Some(site) => site,
            None => return contract(format!("unknown site {}", pm.site_id)),
        };
        if pm.technician_id != site.technician_id {
            return contract(format!(
                "technician for site {} does not match the site's assignment",
                pm.site_id
            ));
        }
    }

    // Overdue priority: every coverable overdue site must be present; when
    // there are more overdue sites than slots, only overdue sites may appear.
    let mut required: Vec<Uuid> = Vec::new();
    let mut required_set: HashSet<Uuid> = HashSet::new();
    for site in ctx.overdue {
        if !ctx.scheduled_site_ids.contains(&site.id) && required_set.insert(site.id) {
            required.push(site.id);
        }
    }

    if required.len() <= ctx.target_site_count {
        for site_id in &required {
            if !seen.contains(site_id) {
                return contract(format!("overdue site {site_id} missing from the plan"));
            }
        }
    } else {
        for pm in &suggestion.suggested_pms {
            if !required_set.contains(&pm.site_id) {
                return contract(format!(
                    "site {} suggested while overdue sites were left out",
                    pm.site_id
                ));
            }
        }
        if suggestion.suggested_pms.len() < ctx.target_site_count {
            return contract(format!(
                "only {} sites suggested with {} overdue sites pending",
                suggestion.suggested_pms.len(),
                required.len()
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site_with_tech(name: &str) -> Site {
        Site {
            id: Uuid::new_v4(),
            name: name.to_string(),
            location: "Ahvaz, Khuzestan".to_string(),
            image_url: None,
            image_hint: None,
            technician_id: Some(Uuid::new_v4()),
        }
    }

    fn week(year: i32, week: u32) -> WeekId {
        WeekId::new(year, week).unwrap()
    }

    struct Fixture {
        sites: Vec<Site>,
        scheduled: HashSet<Uuid>,
        last_scheduled: HashMap<Uuid, WeekId>,
    }

    impl Fixture {
        fn new(count: usize) -> Self {
            Self {
                sites: (0..count).map(|i| site_with_tech(&format!("s{i}"))).collect(),
                scheduled: HashSet::new(),
                last_scheduled: HashMap::new(),
            }
        }

        fn ctx<'a>(&'a self, overdue: &'a [Site], target: usize) -> ComposeContext<'a> {
            ComposeContext {
                overdue,
                all_sites: &self.sites,
                scheduled_site_ids: &self.scheduled,
                last_scheduled: &self.last_scheduled,
                target_site_count: target,
            }
        }
    }

    #[test]
    fn overdue_sites_are_included_and_scheduled_ones_excluded() {
        // Scenario: s1, s2 overdue; s2 already scheduled this week; target 5.
        let mut fx = Fixture::new(4);
        fx.scheduled.insert(fx.sites[1].id);
        let overdue = vec![fx.sites[0].clone(), fx.sites[1].clone()];

        let plan = compose(&fx.ctx(&overdue, 5));

        let ids: Vec<Uuid> = plan.suggested_pms.iter().map(|p| p.site_id).collect();
        assert!(ids.contains(&fx.sites[0].id), "overdue s1 must be planned");
        assert!(!ids.contains(&fx.sites[1].id), "s2 is already scheduled");
        assert!(ids.len() <= 5);
        validate_suggestion(&plan, &fx.ctx(&overdue, 5)).unwrap();
    }

    #[test]
    fn target_count_caps_the_plan_at_overdue_sites_only() {
        // Scenario: two overdue sites, target 1.
        let fx = Fixture::new(2);
        let overdue = fx.sites.clone();

        let plan = compose(&fx.ctx(&overdue, 1));

        assert_eq!(plan.suggested_pms.len(), 1);
        // Deterministic tie-break: first overdue site in input order.
        assert_eq!(plan.suggested_pms[0].site_id, fx.sites[0].id);
    }

    #[test]
    fn fillers_prefer_never_scheduled_then_least_recently_scheduled() {
        let mut fx = Fixture::new(4);
        fx.last_scheduled.insert(fx.sites[0].id, week(2024, 14));
        fx.last_scheduled.insert(fx.sites[1].id, week(2024, 2));
        // sites[2] and sites[3] never scheduled.

        let plan = compose(&fx.ctx(&[], 3));

        let ids: Vec<Uuid> = plan.suggested_pms.iter().map(|p| p.site_id).collect();
        // Never-scheduled first (input order), then the oldest week.
        assert_eq!(ids, vec![fx.sites[2].id, fx.sites[3].id, fx.sites[1].id]);
    }

    #[test]
    fn technician_always_comes_from_the_site() {
        let fx = Fixture::new(3);
        let overdue = vec![fx.sites[1].clone()];

        let plan = compose(&fx.ctx(&overdue, 3));

        for pm in &plan.suggested_pms {
            let site = fx.sites.iter().find(|s| s.id == pm.site_id).unwrap();
            assert_eq!(pm.technician_id, site.technician_id);
        }
    }

    #[test]
    fn compose_output_is_deterministic() {
        let mut fx = Fixture::new(6);
        fx.last_scheduled.insert(fx.sites[4].id, week(2024, 9));
        let overdue = vec![fx.sites[0].clone(), fx.sites[3].clone()];

        let a = compose(&fx.ctx(&overdue, 4));
        let b = compose(&fx.ctx(&overdue, 4));
        assert_eq!(a.suggested_pms, b.suggested_pms);
    }

    #[test]
    fn validation_rejects_oversized_plans() {
        let fx = Fixture::new(3);
        let mut plan = compose(&fx.ctx(&[], 3));
        assert_eq!(plan.suggested_pms.len(), 3);
        plan.reasoning.clear();

        let err = validate_suggestion(&plan, &fx.ctx(&[], 2)).unwrap_err();
        assert!(matches!(err, PlanningError::Contract(_)));
    }

    #[test]
    fn validation_rejects_already_scheduled_and_unknown_sites() {
        let mut fx = Fixture::new(2);
        fx.scheduled.insert(fx.sites[0].id);

        let scheduled = PlanSuggestion {
            suggested_pms: vec![SuggestedPm {
                site_id: fx.sites[0].id,
                technician_id: fx.sites[0].technician_id,
            }],
            reasoning: String::new(),
        };
        assert!(validate_suggestion(&scheduled, &fx.ctx(&[], 3)).is_err());

        let unknown = PlanSuggestion {
            suggested_pms: vec![SuggestedPm {
                site_id: Uuid::new_v4(),
                technician_id: None,
            }],
            reasoning: String::new(),
        };
        assert!(validate_suggestion(&unknown, &fx.ctx(&[], 3)).is_err());
    }

    #[test]
    fn validation_rejects_reassigned_technicians() {
        let fx = Fixture::new(1);
        let plan = PlanSuggestion {
            suggested_pms: vec![SuggestedPm {
                site_id: fx.sites[0].id,
                technician_id: Some(Uuid::new_v4()),
            }],
            reasoning: String::new(),
        };
        assert!(validate_suggestion(&plan, &fx.ctx(&[], 3)).is_err());
    }

    #[test]
    fn validation_requires_every_coverable_overdue_site() {
        let fx = Fixture::new(3);
        let overdue = vec![fx.sites[0].clone(), fx.sites[1].clone()];

        // Plan covers only one of two overdue sites despite room for both.
        let partial = PlanSuggestion {
            suggested_pms: vec![SuggestedPm {
                site_id: fx.sites[0].id,
                technician_id: fx.sites[0].technician_id,
            }],
            reasoning: String::new(),
        };
        let err = validate_suggestion(&partial, &fx.ctx(&overdue, 5)).unwrap_err();
        assert!(matches!(err, PlanningError::Contract(_)));
    }

    #[test]
    fn validation_rejects_fillers_while_overdue_sites_wait() {
        let fx = Fixture::new(4);
        let overdue = vec![fx.sites[0].clone(), fx.sites[1].clone(), fx.sites[2].clone()];

        // Target 2 but a non-overdue site was picked.
        let plan = PlanSuggestion {
            suggested_pms: vec![
                SuggestedPm {
                    site_id: fx.sites[0].id,
                    technician_id: fx.sites[0].technician_id,
                },
                SuggestedPm {
                    site_id: fx.sites[3].id,
                    technician_id: fx.sites[3].technician_id,
                },
            ],
            reasoning: String::new(),
        };
        assert!(validate_suggestion(&plan, &fx.ctx(&overdue, 2)).is_err());
    }
}
