//! Role ranks and what each role may do

use std::fmt;

use crate::db::models::user_roles;

/// Actions gated by role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Read any record
    ViewRecords,
    /// Create and edit households, residents, certificates and blotter cases
    ManageRecords,
    /// Approve, release or reject certificates; manage templates and officials
    ApproveCertificates,
    /// AIPs, projects, expenses, milestones and ledger transactions
    ManageFinance,
    /// Approve signups and change roles
    ManageUsers,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::ViewRecords => "view records",
            Capability::ManageRecords => "manage records",
            Capability::ApproveCertificates => "approve certificates",
            Capability::ManageFinance => "manage finance",
            Capability::ManageUsers => "manage users",
        };
        f.write_str(name)
    }
}

/// Rank of a role; unknown roles rank below STAFF
pub fn role_rank(role: &str) -> u8 {
    match role {
        user_roles::SUPER_ADMIN => 4,
        user_roles::CAPTAIN => 3,
        user_roles::SECRETARY | user_roles::TREASURER => 2,
        user_roles::STAFF => 1,
        _ => 0,
    }
}

/// Whether `role` may perform `capability`
///
/// SECRETARY and TREASURER share a rank but split duties: the secretary
/// signs off certificates, the treasurer keeps the books.
pub fn role_allows(role: &str, capability: Capability) -> bool {
    let rank = role_rank(role);
    match capability {
        Capability::ViewRecords | Capability::ManageRecords => rank >= 1,
        Capability::ApproveCertificates => rank >= 3 || role == user_roles::SECRETARY,
        Capability::ManageFinance => rank >= 3 || role == user_roles::TREASURER,
        Capability::ManageUsers => rank >= 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_super_admin_and_captain_do_everything() {
        for role in [user_roles::SUPER_ADMIN, user_roles::CAPTAIN] {
            for cap in [
                Capability::ViewRecords,
                Capability::ManageRecords,
                Capability::ApproveCertificates,
                Capability::ManageFinance,
                Capability::ManageUsers,
            ] {
                assert!(role_allows(role, cap), "{} should {}", role, cap);
            }
        }
    }

    #[test]
    fn test_split_duties() {
        assert!(role_allows(user_roles::SECRETARY, Capability::ApproveCertificates));
        assert!(!role_allows(user_roles::SECRETARY, Capability::ManageFinance));
        assert!(role_allows(user_roles::TREASURER, Capability::ManageFinance));
        assert!(!role_allows(user_roles::TREASURER, Capability::ApproveCertificates));
        assert!(!role_allows(user_roles::TREASURER, Capability::ManageUsers));
    }

    #[test]
    fn test_staff_and_unknown() {
        assert!(role_allows(user_roles::STAFF, Capability::ManageRecords));
        assert!(!role_allows(user_roles::STAFF, Capability::ApproveCertificates));
        assert!(!role_allows("VISITOR", Capability::ViewRecords));
    }
}
