//! Plan application
//!
//! Turns an accepted suggestion into concrete Pending PM records. Building is
//! all-or-nothing: an unknown site anywhere in the suggestion fails the whole
//! batch so the caller never persists a partial plan.

use std::collections::HashMap;

use thiserror::Error;
use uuid::Uuid;

use crate::domain::sites::Site;
use crate::domain::tasks::{TaskResult, TaskTemplate};
use crate::domain::weekly_pm::{PmStatus, WeekId, WeeklyPm};
use crate::planning::composer::SuggestedPm;

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("plan references unknown site {0}")]
    UnknownSite(Uuid),
}

/// Materialise a suggestion into WeeklyPm records for `week`.
///
/// Each record starts Pending with one blank task result per catalog task and
/// the technician taken from the site itself (not from the suggestion, which
/// may be stale by the time the plan is applied).
pub fn build_planned_pms(
    suggested: &[SuggestedPm],
    week: WeekId,
    catalog: &[TaskTemplate],
    sites: &[Site],
) -> Result<Vec<WeeklyPm>, ApplyError> {
    let sites_by_id: HashMap<Uuid, &Site> = sites.iter().map(|s| (s.id, s)).collect();

    suggested
        .iter()
        .map(|entry| {
            let site = sites_by_id
                .get(&entry.site_id)
                .ok_or(ApplyError::UnknownSite(entry.site_id))?;
            Ok(WeeklyPm {
                id: Uuid::new_v4(),
                week,
                site_id: site.id,
                assigned_technician_id: site.technician_id,
                status: PmStatus::Pending,
                tasks: catalog.iter().map(TaskResult::blank_for).collect(),
                cr_number: None,
                comments: Vec::new(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tasks::default_catalog;

    fn site() -> Site {
        Site {
            id: Uuid::new_v4(),
            name: "BTS-041".to_string(),
            location: "Mashhad, Razavi Khorasan".to_string(),
            image_url: None,
            image_hint: None,
            technician_id: Some(Uuid::new_v4()),
        }
    }

    #[test]
    fn builds_one_pending_pm_per_entry_with_full_task_set() {
        let catalog = default_catalog();
        let sites = vec![site(), site()];
        let suggested: Vec<SuggestedPm> = sites
            .iter()
            .map(|s| SuggestedPm {
                site_id: s.id,
                technician_id: s.technician_id,
            })
            .collect();
        let week = WeekId::new(2024, 30).unwrap();

        let pms = build_planned_pms(&suggested, week, &catalog, &sites).unwrap();

        assert_eq!(pms.len(), suggested.len());
        for (pm, s) in pms.iter().zip(&sites) {
            assert_eq!(pm.week, week);
            assert_eq!(pm.site_id, s.id);
            assert_eq!(pm.assigned_technician_id, s.technician_id);
            assert_eq!(pm.status, PmStatus::Pending);
            assert_eq!(pm.tasks.len(), catalog.len());
            for task in &pm.tasks {
                assert!(!task.is_completed);
                assert!(task.notes.is_empty());
                assert!(task.photos.is_empty());
                assert!(task.checklist.is_empty());
                assert!(task.custom_fields.is_empty());
                assert!(task.location.is_none());
            }
        }
    }

    #[test]
    fn unknown_site_fails_the_whole_batch() {
        let catalog = default_catalog();
        let known = site();
        let suggested = vec![
            SuggestedPm {
                site_id: known.id,
                technician_id: known.technician_id,
            },
            SuggestedPm {
                site_id: Uuid::new_v4(),
                technician_id: None,
            },
        ];

        let result = build_planned_pms(
            &suggested,
            WeekId::new(2024, 30).unwrap(),
            &catalog,
            &[known],
        );
        assert!(matches!(result, Err(ApplyError::UnknownSite(_))));
    }
}
