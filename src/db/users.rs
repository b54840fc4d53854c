//! Staff account storage
//!
//! Accounts are never physically deleted; `deactivate_user` flips the status.

use diesel::prelude::*;
use serde::Deserialize;

use super::diesel_schema::users;
use super::models::{current_timestamp, user_statuses, NewUser, User, UserChanges};
use super::{like_pattern, new_id};
use crate::error::RegistryError;

/// Query parameters for listing users
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

pub fn create_user(
    conn: &mut SqliteConnection,
    name: &str,
    email: &str,
    password_hash: &str,
    role: &str,
    status: &str,
) -> Result<User, RegistryError> {
    let id = new_id();
    let now = current_timestamp();
    let email = email.trim().to_lowercase();

    let new_user = NewUser {
        id: &id,
        name,
        email: &email,
        password_hash,
        role,
        status,
        created_at: &now,
        updated_at: &now,
    };

    diesel::insert_into(users::table)
        .values(&new_user)
        .execute(conn)
        .map_err(|e| match RegistryError::from(e) {
            RegistryError::Conflict(_) => {
                RegistryError::Conflict(format!("Email already registered: {}", email))
            }
            other => other,
        })?;

    users::table.find(&id).first(conn).map_err(Into::into)
}

pub fn get_user(conn: &mut SqliteConnection, id: &str) -> Result<Option<User>, RegistryError> {
    users::table.find(id).first(conn).optional().map_err(Into::into)
}

/// Look up by email, case-insensitively
pub fn get_user_by_email(
    conn: &mut SqliteConnection,
    email: &str,
) -> Result<Option<User>, RegistryError> {
    users::table
        .filter(users::email.eq(email.trim().to_lowercase()))
        .first(conn)
        .optional()
        .map_err(Into::into)
}

pub fn list_users(conn: &mut SqliteConnection, query: &UserQuery) -> Result<Vec<User>, RegistryError> {
    let mut q = users::table.into_boxed();

    if let Some(ref role) = query.role {
        q = q.filter(users::role.eq(role));
    }
    if let Some(ref status) = query.status {
        q = q.filter(users::status.eq(status));
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        q = q.filter(
            users::name
                .like(pattern.clone())
                .escape('\\')
                .or(users::email.like(pattern).escape('\\')),
        );
    }

    q.order(users::name.asc()).load(conn).map_err(Into::into)
}

/// Apply a partial update; returns None when the user does not exist
pub fn update_user(
    conn: &mut SqliteConnection,
    id: &str,
    changes: UserChanges<'_>,
) -> Result<Option<User>, RegistryError> {
    let now = current_timestamp();
    let changes = UserChanges {
        updated_at: Some(&now),
        ..changes
    };

    let updated = diesel::update(users::table.find(id))
        .set(&changes)
        .execute(conn)?;

    if updated == 0 {
        return Ok(None);
    }
    get_user(conn, id)
}

pub fn deactivate_user(conn: &mut SqliteConnection, id: &str) -> Result<Option<User>, RegistryError> {
    update_user(
        conn,
        id,
        UserChanges {
            status: Some(user_statuses::INACTIVE),
            ..Default::default()
        },
    )
}

/// Record a successful login
pub fn touch_login(conn: &mut SqliteConnection, id: &str) -> Result<(), RegistryError> {
    let now = current_timestamp();
    diesel::update(users::table.find(id))
        .set(users::last_login_at.eq(Some(&now)))
        .execute(conn)?;
    Ok(())
}

pub fn count_users(conn: &mut SqliteConnection) -> Result<i64, RegistryError> {
    users::table.count().get_result(conn).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::user_roles;
    use crate::db::test_conn as setup;

    #[test]
    fn test_create_and_lookup_by_email() {
        let mut conn = setup();
        let user = create_user(
            &mut conn,
            "Maria Clara",
            "Maria@Example.com ",
            "hash",
            user_roles::SECRETARY,
            user_statuses::ACTIVE,
        )
        .unwrap();

        assert_eq!(user.email, "maria@example.com");
        let found = get_user_by_email(&mut conn, "MARIA@example.com").unwrap().unwrap();
        assert_eq!(found.id, user.id);
    }

    #[test]
    fn test_duplicate_email_conflicts() {
        let mut conn = setup();
        create_user(&mut conn, "A", "a@example.com", "h", user_roles::STAFF, user_statuses::ACTIVE)
            .unwrap();
        let err = create_user(&mut conn, "B", "a@example.com", "h", user_roles::STAFF, user_statuses::ACTIVE)
            .unwrap_err();
        assert!(matches!(err, RegistryError::Conflict(_)));
    }

    #[test]
    fn test_deactivate_keeps_row() {
        let mut conn = setup();
        let user = create_user(&mut conn, "A", "a@example.com", "h", user_roles::STAFF, user_statuses::ACTIVE)
            .unwrap();

        let user = deactivate_user(&mut conn, &user.id).unwrap().unwrap();
        assert_eq!(user.status, user_statuses::INACTIVE);
        assert_eq!(count_users(&mut conn).unwrap(), 1);
        assert!(deactivate_user(&mut conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_list_filters() {
        let mut conn = setup();
        create_user(&mut conn, "Ana", "ana@example.com", "h", user_roles::TREASURER, user_statuses::ACTIVE)
            .unwrap();
        create_user(&mut conn, "Ben", "ben@example.com", "h", user_roles::STAFF, user_statuses::PENDING)
            .unwrap();

        let all = list_users(&mut conn, &UserQuery::default()).unwrap();
        assert_eq!(all.len(), 2);

        let pending = list_users(
            &mut conn,
            &UserQuery {
                status: Some(user_statuses::PENDING.into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].name, "Ben");

        let search = list_users(
            &mut conn,
            &UserQuery {
                search: Some("ana@".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(search.len(), 1);
    }
}
