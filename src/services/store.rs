//! In-memory document store
//!
//! Stands in for the hosted document database: list-all, get-by-id, create
//! with a generated id, replace-by-id, plus the client-side filters the app
//! needs. One store is constructed at startup and handed to every handler
//! through `AppState`; all collections sit behind a single lock so batch
//! inserts are atomic.
//!
//! Weekly PMs carry the one hard constraint: at most one record per
//! (site, week). Duplicate inserts are rejected, never silently kept.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::change_requests::ChangeRequest;
use crate::domain::sites::Site;
use crate::domain::tasks::TaskTemplate;
use crate::domain::tech_requests::TechRequest;
use crate::domain::users::User;
use crate::domain::weekly_pm::{PmStatus, WeekId, WeeklyPm};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username '{0}' is already taken")]
    DuplicateUsername(String),

    #[error("a weekly PM for site {site_id} in {week} already exists")]
    DuplicatePm { site_id: Uuid, week: WeekId },

    #[error("record not found")]
    NotFound,
}

/// Full store contents; also the on-disk seed file shape.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub sites: Vec<Site>,
    #[serde(default)]
    pub tasks: Vec<TaskTemplate>,
    #[serde(default)]
    pub weekly_pms: Vec<WeeklyPm>,
    #[serde(default)]
    pub change_requests: Vec<ChangeRequest>,
    #[serde(default)]
    pub tech_requests: Vec<TechRequest>,
}

pub struct Store {
    inner: RwLock<Snapshot>,
}

impl Store {
    /// Empty store with the given task catalog.
    pub fn new(catalog: Vec<TaskTemplate>) -> Self {
        Self {
            inner: RwLock::new(Snapshot {
                tasks: catalog,
                ..Snapshot::default()
            }),
        }
    }

    /// Store pre-populated from a JSON seed file.
    pub fn from_seed_file(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open seed file {}", path.display()))?;
        let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse seed file {}", path.display()))?;
        tracing::info!(
            users = snapshot.users.len(),
            sites = snapshot.sites.len(),
            tasks = snapshot.tasks.len(),
            weekly_pms = snapshot.weekly_pms.len(),
            "Seed data loaded"
        );
        Ok(Self {
            inner: RwLock::new(snapshot),
        })
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub fn list_users(&self) -> Vec<User> {
        self.inner.read().users.clone()
    }

    pub fn get_user(&self, id: Uuid) -> Option<User> {
        self.inner.read().users.iter().find(|u| u.id == id).cloned()
    }

    /// Insert a user, enforcing username uniqueness under the write lock.
    pub fn insert_user(&self, user: User) -> Result<User, StoreError> {
        let mut inner = self.inner.write();
        if inner.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::DuplicateUsername(user.username));
        }
        inner.users.push(user.clone());
        Ok(user)
    }

    /// Replace a user by id. Username uniqueness still holds against the
    /// other users.
    pub fn replace_user(&self, user: User) -> Result<User, StoreError> {
        let mut inner = self.inner.write();
        if inner
            .users
            .iter()
            .any(|u| u.id != user.id && u.username == user.username)
        {
            return Err(StoreError::DuplicateUsername(user.username));
        }
        let slot = inner
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(StoreError::NotFound)?;
        *slot = user.clone();
        Ok(user)
    }

    pub fn delete_user(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let before = inner.users.len();
        inner.users.retain(|u| u.id != id);
        if inner.users.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    // =========================================================================
    // Sites
    // =========================================================================

    pub fn list_sites(&self) -> Vec<Site> {
        self.inner.read().sites.clone()
    }

    pub fn get_site(&self, id: Uuid) -> Option<Site> {
        self.inner.read().sites.iter().find(|s| s.id == id).cloned()
    }

    pub fn insert_site(&self, site: Site) -> Site {
        self.inner.write().sites.push(site.clone());
        site
    }

    pub fn replace_site(&self, site: Site) -> Result<Site, StoreError> {
        let mut inner = self.inner.write();
        let slot = inner
            .sites
            .iter_mut()
            .find(|s| s.id == site.id)
            .ok_or(StoreError::NotFound)?;
        *slot = site.clone();
        Ok(site)
    }

    // =========================================================================
    // Task catalog (immutable after startup)
    // =========================================================================

    pub fn task_catalog(&self) -> Vec<TaskTemplate> {
        self.inner.read().tasks.clone()
    }

    // =========================================================================
    // Weekly PMs
    // =========================================================================

    pub fn list_pms(&self) -> Vec<WeeklyPm> {
        self.inner.read().weekly_pms.clone()
    }

    pub fn get_pm(&self, id: Uuid) -> Option<WeeklyPm> {
        self.inner
            .read()
            .weekly_pms
            .iter()
            .find(|pm| pm.id == id)
            .cloned()
    }

    /// Insert a single PM, rejecting a duplicate (site, week).
    pub fn add_pm(&self, pm: WeeklyPm) -> Result<WeeklyPm, StoreError> {
        self.add_pms(vec![pm]).map(|mut v| v.remove(0))
    }

    /// Atomic batch insert. The whole batch is checked for (site, week)
    /// collisions, against existing records and within itself, before
    /// anything is appended; on conflict nothing is applied.
    pub fn add_pms(&self, pms: Vec<WeeklyPm>) -> Result<Vec<WeeklyPm>, StoreError> {
        let mut inner = self.inner.write();
        for (i, pm) in pms.iter().enumerate() {
            let clash_existing = inner
                .weekly_pms
                .iter()
                .any(|e| e.site_id == pm.site_id && e.week == pm.week);
            let clash_batch = pms[..i]
                .iter()
                .any(|e| e.site_id == pm.site_id && e.week == pm.week);
            if clash_existing || clash_batch {
                return Err(StoreError::DuplicatePm {
                    site_id: pm.site_id,
                    week: pm.week,
                });
            }
        }
        inner.weekly_pms.extend(pms.iter().cloned());
        Ok(pms)
    }

    /// Replace a PM by id; a miss is reported, not swallowed.
    pub fn replace_pm(&self, pm: WeeklyPm) -> Result<WeeklyPm, StoreError> {
        let mut inner = self.inner.write();
        let slot = inner
            .weekly_pms
            .iter_mut()
            .find(|e| e.id == pm.id)
            .ok_or(StoreError::NotFound)?;
        *slot = pm.clone();
        Ok(pm)
    }

    pub fn pms_by_week(&self, week: WeekId) -> Vec<WeeklyPm> {
        self.inner
            .read()
            .weekly_pms
            .iter()
            .filter(|pm| pm.week == week)
            .cloned()
            .collect()
    }

    pub fn pms_by_site(&self, site_id: Uuid) -> Vec<WeeklyPm> {
        self.inner
            .read()
            .weekly_pms
            .iter()
            .filter(|pm| pm.site_id == site_id)
            .cloned()
            .collect()
    }

    pub fn pms_by_technician(&self, technician_id: Uuid) -> Vec<WeeklyPm> {
        self.inner
            .read()
            .weekly_pms
            .iter()
            .filter(|pm| pm.assigned_technician_id == Some(technician_id))
            .cloned()
            .collect()
    }

    pub fn pms_by_status(&self, status: PmStatus) -> Vec<WeeklyPm> {
        self.inner
            .read()
            .weekly_pms
            .iter()
            .filter(|pm| pm.status == status)
            .cloned()
            .collect()
    }

    // =========================================================================
    // Change requests
    // =========================================================================

    pub fn list_change_requests(&self) -> Vec<ChangeRequest> {
        self.inner.read().change_requests.clone()
    }

    pub fn get_change_request(&self, id: Uuid) -> Option<ChangeRequest> {
        self.inner
            .read()
            .change_requests
            .iter()
            .find(|cr| cr.id == id)
            .cloned()
    }

    pub fn insert_change_request(&self, cr: ChangeRequest) -> ChangeRequest {
        self.inner.write().change_requests.push(cr.clone());
        cr
    }

    pub fn replace_change_request(&self, cr: ChangeRequest) -> Result<ChangeRequest, StoreError> {
        let mut inner = self.inner.write();
        let slot = inner
            .change_requests
            .iter_mut()
            .find(|e| e.id == cr.id)
            .ok_or(StoreError::NotFound)?;
        *slot = cr.clone();
        Ok(cr)
    }

    // =========================================================================
    // Tech requests
    // =========================================================================

    pub fn list_tech_requests(&self) -> Vec<TechRequest> {
        self.inner.read().tech_requests.clone()
    }

    pub fn get_tech_request(&self, id: Uuid) -> Option<TechRequest> {
        self.inner
            .read()
            .tech_requests
            .iter()
            .find(|tr| tr.id == id)
            .cloned()
    }

    pub fn insert_tech_request(&self, tr: TechRequest) -> TechRequest {
        self.inner.write().tech_requests.push(tr.clone());
        tr
    }

    pub fn replace_tech_request(&self, tr: TechRequest) -> Result<TechRequest, StoreError> {
        let mut inner = self.inner.write();
        let slot = inner
            .tech_requests
            .iter_mut()
            .find(|e| e.id == tr.id)
            .ok_or(StoreError::NotFound)?;
        *slot = tr.clone();
        Ok(tr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tasks::default_catalog;
    use crate::domain::users::Role;

    fn user(username: &str, role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            name: username.to_string(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            role,
            avatar_url: None,
            password: None,
        }
    }

    fn pm(site_id: Uuid, year: i32, week: u32) -> WeeklyPm {
        WeeklyPm {
            id: Uuid::new_v4(),
            week: WeekId::new(year, week).unwrap(),
            site_id,
            assigned_technician_id: None,
            status: PmStatus::Pending,
            tasks: Vec::new(),
            cr_number: None,
            comments: Vec::new(),
        }
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let store = Store::new(default_catalog());
        store.insert_user(user("karim", Role::Technician)).unwrap();
        let err = store.insert_user(user("karim", Role::Pm)).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUsername(_)));
        assert_eq!(store.list_users().len(), 1);
    }

    #[test]
    fn duplicate_site_week_pm_is_rejected() {
        let store = Store::new(default_catalog());
        let site_id = Uuid::new_v4();
        store.add_pm(pm(site_id, 2024, 20)).unwrap();

        let err = store.add_pm(pm(site_id, 2024, 20)).unwrap_err();
        assert!(matches!(err, StoreError::DuplicatePm { .. }));
        // Same site, different week is fine.
        store.add_pm(pm(site_id, 2024, 21)).unwrap();
        assert_eq!(store.list_pms().len(), 2);
    }

    #[test]
    fn batch_insert_applies_nothing_on_conflict() {
        let store = Store::new(default_catalog());
        let existing_site = Uuid::new_v4();
        store.add_pm(pm(existing_site, 2024, 20)).unwrap();

        let batch = vec![pm(Uuid::new_v4(), 2024, 20), pm(existing_site, 2024, 20)];
        assert!(store.add_pms(batch).is_err());
        assert_eq!(store.list_pms().len(), 1, "conflicting batch must not apply");
    }

    #[test]
    fn batch_insert_rejects_internal_duplicates() {
        let store = Store::new(default_catalog());
        let site_id = Uuid::new_v4();
        let batch = vec![pm(site_id, 2024, 20), pm(site_id, 2024, 20)];
        assert!(store.add_pms(batch).is_err());
        assert!(store.list_pms().is_empty());
    }

    #[test]
    fn replace_pm_reports_a_miss() {
        let store = Store::new(default_catalog());
        let err = store.replace_pm(pm(Uuid::new_v4(), 2024, 20)).unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn pm_filters_project_by_week_site_technician_and_status() {
        let store = Store::new(default_catalog());
        let site_a = Uuid::new_v4();
        let site_b = Uuid::new_v4();
        let tech = Uuid::new_v4();

        let mut first = pm(site_a, 2024, 20);
        first.assigned_technician_id = Some(tech);
        first.status = PmStatus::Completed;
        store.add_pm(first).unwrap();
        store.add_pm(pm(site_b, 2024, 20)).unwrap();
        store.add_pm(pm(site_a, 2024, 21)).unwrap();

        assert_eq!(store.pms_by_week(WeekId::new(2024, 20).unwrap()).len(), 2);
        assert_eq!(store.pms_by_site(site_a).len(), 2);
        assert_eq!(store.pms_by_technician(tech).len(), 1);
        assert_eq!(store.pms_by_status(PmStatus::Completed).len(), 1);
        assert_eq!(store.pms_by_status(PmStatus::Pending).len(), 2);
    }

    #[test]
    fn replace_user_keeps_usernames_unique() {
        let store = Store::new(default_catalog());
        let a = store.insert_user(user("a", Role::Technician)).unwrap();
        store.insert_user(user("b", Role::Technician)).unwrap();

        let mut renamed = a.clone();
        renamed.username = "b".to_string();
        assert!(matches!(
            store.replace_user(renamed),
            Err(StoreError::DuplicateUsername(_))
        ));

        // Replacing with its own username is not a collision.
        let mut same = a;
        same.name = "renamed".to_string();
        store.replace_user(same).unwrap();
    }
}
