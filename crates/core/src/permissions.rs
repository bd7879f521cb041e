//! Per-section stage permissions for admin reviewers.
//!
//! A superadmin implicitly holds every permission. Plain admins may be
//! restricted to a subset of sections via a `section name -> permissions`
//! map stored on their profile; an admin with no map at all is treated as
//! unrestricted (the historical default before stage permissions existed).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::roles;
use crate::section::Section;

/// A single capability on a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StagePermission {
    View,
    Comment,
}

/// Section name -> granted permissions. Keyed by the stored section names.
pub type StagePermissionsMap = BTreeMap<String, Vec<StagePermission>>;

/// The slice of a user profile the review engine needs to authorize an
/// action: role plus optional per-section restrictions.
#[derive(Debug, Clone)]
pub struct ActorProfile {
    pub id: crate::types::EntityId,
    pub email: String,
    pub role: String,
    pub stage_permissions: Option<StagePermissionsMap>,
}

impl ActorProfile {
    /// Whether this actor may review (approve / request changes on) the
    /// given section. Fails closed: partners never may, and a restricted
    /// admin needs `comment` on the section.
    pub fn can_review(&self, section: Section) -> bool {
        if !roles::is_admin_role(&self.role) {
            return false;
        }
        if self.role == roles::ROLE_SUPERADMIN {
            return true;
        }
        match &self.stage_permissions {
            None => true,
            Some(map) => map
                .get(section.as_str())
                .is_some_and(|perms| perms.contains(&StagePermission::Comment)),
        }
    }

    /// Whether this actor may view the given section's documents and chat.
    pub fn can_view(&self, section: Section) -> bool {
        if !roles::is_admin_role(&self.role) {
            return false;
        }
        if self.role == roles::ROLE_SUPERADMIN {
            return true;
        }
        match &self.stage_permissions {
            None => true,
            Some(map) => map.get(section.as_str()).is_some_and(|perms| {
                perms.contains(&StagePermission::View) || perms.contains(&StagePermission::Comment)
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin_with(perms: Option<StagePermissionsMap>) -> ActorProfile {
        ActorProfile {
            id: uuid::Uuid::new_v4(),
            email: "reviewer@example.com".to_string(),
            role: roles::ROLE_ADMIN.to_string(),
            stage_permissions: perms,
        }
    }

    #[test]
    fn partner_cannot_review() {
        let mut actor = admin_with(None);
        actor.role = roles::ROLE_PARTNER.to_string();
        assert!(!actor.can_review(Section::Compliance));
        assert!(!actor.can_view(Section::Compliance));
    }

    #[test]
    fn superadmin_always_allowed() {
        let mut actor = admin_with(Some(StagePermissionsMap::new()));
        actor.role = roles::ROLE_SUPERADMIN.to_string();
        assert!(actor.can_review(Section::Security));
    }

    #[test]
    fn unrestricted_admin_allowed() {
        let actor = admin_with(None);
        assert!(actor.can_review(Section::Attestations));
        assert!(actor.can_view(Section::Attestations));
    }

    #[test]
    fn restricted_admin_needs_comment_to_review() {
        let mut map = StagePermissionsMap::new();
        map.insert(
            Section::Compliance.as_str().to_string(),
            vec![StagePermission::View],
        );
        let actor = admin_with(Some(map));
        assert!(actor.can_view(Section::Compliance));
        assert!(!actor.can_review(Section::Compliance));
        // Sections missing from the map are denied outright.
        assert!(!actor.can_view(Section::Security));
    }

    #[test]
    fn comment_permission_implies_view() {
        let mut map = StagePermissionsMap::new();
        map.insert(
            Section::Security.as_str().to_string(),
            vec![StagePermission::Comment],
        );
        let actor = admin_with(Some(map));
        assert!(actor.can_review(Section::Security));
        assert!(actor.can_view(Section::Security));
    }
}
