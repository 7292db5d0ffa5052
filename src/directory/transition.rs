//! Confirmation-gated activation transitions
//!
//! A transition is first requested, which checks the caller's role and yields
//! a [`PendingConfirmation`]. Nothing is sent until it is confirmed; a
//! cancelled request has no side effects.

use std::fmt;

use tracing::debug;

use crate::error::Result;
use crate::types::{CurrentUser, School, SchoolId};

use super::service::SchoolDirectoryService;

/// The two activation transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Active to Inactive
    Deactivate,
    /// Inactive to Active
    Reactivate,
}

impl Transition {
    pub fn for_target(target_active: bool) -> Self {
        if target_active {
            Transition::Reactivate
        } else {
            Transition::Deactivate
        }
    }

    pub fn target_active(&self) -> bool {
        matches!(self, Transition::Reactivate)
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Transition::Deactivate => "deactivate",
            Transition::Reactivate => "reactivate",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// A transition waiting for the user's yes/no answer
#[must_use = "a pending transition does nothing until confirmed or cancelled"]
pub struct PendingConfirmation<'a> {
    service: &'a SchoolDirectoryService,
    school_id: SchoolId,
    school_name: String,
    transition: Transition,
}

impl fmt::Debug for PendingConfirmation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingConfirmation")
            .field("school_id", &self.school_id)
            .field("transition", &self.transition)
            .finish()
    }
}

impl<'a> PendingConfirmation<'a> {
    pub fn school_id(&self) -> &SchoolId {
        &self.school_id
    }

    pub fn transition(&self) -> Transition {
        self.transition
    }

    /// Question to put to the user
    pub fn prompt(&self) -> String {
        match self.transition {
            Transition::Deactivate => format!(
                "Deactivate {}? It will no longer appear among active schools.",
                self.school_name
            ),
            Transition::Reactivate => format!(
                "Reactivate {}? It will appear among active schools again.",
                self.school_name
            ),
        }
    }

    /// Issue the transition. Returns the server's confirmation message.
    pub async fn confirm(self) -> Result<String> {
        debug!(school_id = %self.school_id, transition = %self.transition, "Transition confirmed");
        self.service
            .set_active(&self.school_id, self.transition.target_active())
            .await
    }

    /// Drop the request without contacting the server
    pub fn cancel(self) {
        debug!(school_id = %self.school_id, transition = %self.transition, "Transition cancelled");
    }
}

impl SchoolDirectoryService {
    /// Begin a transition on behalf of `user`.
    ///
    /// Only a Super Admin may proceed. The school's current flag is not
    /// checked; a repeated transition is left to the server to judge.
    pub fn request_transition(
        &self,
        user: &CurrentUser,
        school: &School,
        target_active: bool,
    ) -> Result<PendingConfirmation<'_>> {
        let transition = Transition::for_target(target_active);
        user.require_super_admin(&format!("{} schools", transition.verb()))?;

        Ok(PendingConfirmation {
            service: self,
            school_id: school.id.clone(),
            school_name: school.name.clone(),
            transition,
        })
    }
}
