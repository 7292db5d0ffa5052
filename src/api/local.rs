//! Seed-backed directory
//!
//! Serves the directory and summary contracts from the local seed store when
//! no remote API is configured. Every write replaces the whole collection.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Error, Result};
use crate::seed::SeedStore;
use crate::types::{Board, CurrentUser, NewSchool, Role, RoleSummary, School, SchoolId};

use super::{DirectoryApi, SchoolList, SummaryApi, TransitionReply};

pub struct LocalDirectory {
    store: Arc<SeedStore>,
}

impl LocalDirectory {
    pub fn new(store: Arc<SeedStore>) -> Self {
        Self { store }
    }

    fn set_flag(&self, id: &SchoolId, target: bool, action: &'static str) -> Result<TransitionReply> {
        let mut schools: Vec<School> = self.store.load()?;
        let school = schools
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| Error::transition_failed(id.as_str(), action, "School not found"))?;

        school.is_active = target;
        self.store.save(&schools)?;
        debug!(school_id = %id, is_active = target, "Local activation flag updated");

        Ok(TransitionReply::confirmed(if target {
            "School reactivated"
        } else {
            "School deactivated"
        }))
    }
}

#[async_trait]
impl DirectoryApi for LocalDirectory {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn list_by_status(&self, is_active: bool) -> Result<SchoolList> {
        let schools: Vec<School> = self.store.load()?;
        Ok(SchoolList {
            schools: schools
                .into_iter()
                .filter(|s| s.is_active == is_active)
                .collect(),
        })
    }

    async fn get_by_id(&self, id: &SchoolId) -> Result<School> {
        let schools: Vec<School> = self.store.load()?;
        schools
            .into_iter()
            .find(|s| &s.id == id)
            .ok_or_else(|| Error::fetch_failed("school", format!("no school with id {}", id)))
    }

    async fn deactivate(&self, id: &SchoolId) -> Result<TransitionReply> {
        self.set_flag(id, false, "deactivate")
    }

    async fn reactivate(&self, id: &SchoolId) -> Result<TransitionReply> {
        self.set_flag(id, true, "reactivate")
    }

    async fn create(&self, draft: NewSchool) -> Result<School> {
        self.store.add_entity(draft)
    }

    async fn list_boards(&self) -> Result<Vec<Board>> {
        self.store.load()
    }

    async fn boards_for_school(&self, id: &SchoolId) -> Result<Vec<Board>> {
        Ok(self.get_by_id(id).await?.boards)
    }
}

/// Users counted for an active school: its admin plus enrolled staff and
/// students.
fn active_users(school: &School) -> u64 {
    school.teacher_count + school.student_count + u64::from(school.admin_id.is_some())
}

#[async_trait]
impl SummaryApi for LocalDirectory {
    async fn get_summary(&self, user: &CurrentUser) -> Result<RoleSummary> {
        let schools: Vec<School> = self.store.load()?;
        debug!(role = %user.role, schools = schools.len(), "Computing local summary");

        match user.role {
            Role::SuperAdmin => {
                let active: Vec<&School> = schools.iter().filter(|s| s.is_active).collect();
                Ok(RoleSummary::new()
                    .with("total_schools", active.len() as u64)
                    .with(
                        "total_active_users",
                        active.iter().map(|s| active_users(s)).sum::<u64>(),
                    ))
            }
            Role::Admin => {
                let id = user.require_school()?;
                let school = schools
                    .iter()
                    .find(|s| &s.id == id)
                    .ok_or_else(|| Error::fetch_failed("dashboard summary", "No school found for this user."))?;

                // The seed store keeps no class records.
                Ok(RoleSummary::new()
                    .with("total_teachers", school.teacher_count)
                    .with("total_students", school.student_count)
                    .with("total_classes", 0u64))
            }
            Role::Teacher | Role::Student => Ok(RoleSummary::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::summarize;

    fn local() -> LocalDirectory {
        LocalDirectory::new(Arc::new(SeedStore::in_memory()))
    }

    #[tokio::test]
    async fn test_seeded_school_is_listed_active() {
        let api = local();
        let active = api.list_by_status(true).await.unwrap();
        assert_eq!(active.schools.len(), 1);
        assert!(api.list_by_status(false).await.unwrap().schools.is_empty());
    }

    #[tokio::test]
    async fn test_deactivate_then_reactivate() {
        let api = local();
        let id = SchoolId::from("1");

        let reply = api.deactivate(&id).await.unwrap();
        assert_eq!(reply.confirmation(), Some("School deactivated"));
        assert!(!api.get_by_id(&id).await.unwrap().is_active);

        let reply = api.reactivate(&id).await.unwrap();
        assert_eq!(reply.confirmation(), Some("School reactivated"));
        assert!(api.get_by_id(&id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_unknown_id_is_rejected() {
        let err = local().deactivate(&SchoolId::from("404")).await.unwrap_err();
        assert!(matches!(err, Error::TransitionFailed { .. }));
    }

    #[tokio::test]
    async fn test_summary_counts_only_active_schools() {
        let api = local();
        let super_admin = CurrentUser::new(Role::SuperAdmin);
        api.create(NewSchool::new("Riverside")).await.unwrap();
        api.deactivate(&SchoolId::from("1")).await.unwrap();

        let summary = api.get_summary(&super_admin).await.unwrap();
        assert_eq!(summary.count("total_schools"), Some(1));
        assert_eq!(summary.count("total_active_users"), Some(0));
    }

    #[tokio::test]
    async fn test_deactivating_only_school_empties_super_admin_totals() {
        let api = local();
        api.deactivate(&SchoolId::from("1")).await.unwrap();

        let summary = api.get_summary(&CurrentUser::new(Role::SuperAdmin)).await.unwrap();
        let metrics = summarize(Role::SuperAdmin, Some(&summary));
        assert_eq!(metrics.value("total_schools"), Some(0));
        assert!(!metrics.unavailable);
    }

    #[tokio::test]
    async fn test_admin_summary_is_scoped_to_own_school() {
        let store = Arc::new(SeedStore::in_memory());
        let mut schools: Vec<School> = store.load().unwrap();
        schools[0].teacher_count = 12;
        schools[0].student_count = 340;
        let mut other = NewSchool::new("Riverside").into_school(SchoolId::from("2"));
        other.teacher_count = 5;
        other.student_count = 80;
        schools.push(other);
        store.save(&schools).unwrap();
        let api = LocalDirectory::new(store);

        let admin = CurrentUser::new(Role::Admin).with_school("2");
        let summary = api.get_summary(&admin).await.unwrap();
        assert_eq!(summary.count("total_teachers"), Some(5));
        assert_eq!(summary.count("total_students"), Some(80));
        assert_eq!(summary.count("total_classes"), Some(0));
        assert_eq!(summary.get("total_schools"), None);

        let super_admin = CurrentUser::new(Role::SuperAdmin);
        let summary = api.get_summary(&super_admin).await.unwrap();
        assert_eq!(summary.count("total_schools"), Some(2));
        assert_eq!(summary.count("total_active_users"), Some(1 + 12 + 340 + 5 + 80));
    }

    #[tokio::test]
    async fn test_admin_summary_needs_a_known_school() {
        let api = local();

        let err = api.get_summary(&CurrentUser::new(Role::Admin)).await.unwrap_err();
        assert!(matches!(err, Error::NoSchoolAffiliation { .. }));

        let stranger = CurrentUser::new(Role::Admin).with_school("404");
        let err = api.get_summary(&stranger).await.unwrap_err();
        assert!(err.to_string().contains("No school found"));
    }

    #[tokio::test]
    async fn test_teacher_and_student_summaries_are_empty() {
        let api = local();
        for role in [Role::Teacher, Role::Student] {
            assert!(api.get_summary(&CurrentUser::new(role)).await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_boards_for_seeded_school() {
        let boards = local().boards_for_school(&SchoolId::from("1")).await.unwrap();
        assert_eq!(boards.len(), 1);
        assert_eq!(boards[0].name, "CBSE");
    }
}
