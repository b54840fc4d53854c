//! Staff accounts: signup, login, session checks and admin updates
//!
//! New signups wait in PENDING until an administrator activates them. The
//! very first account on an empty database is made an active SUPER_ADMIN so
//! a fresh install can be bootstrapped.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::{
    hash_password, role_rank, verify_password, Claims, TokenIssuer, MIN_PASSWORD_LEN,
};
use crate::db::models::{user_roles, user_statuses, User, UserChanges};
use crate::db::{users, Database};
use crate::error::RegistryError;

use super::events::{EventBus, RegistryEvent};
use super::validation;

/// The account making an admin change; `id` is `None` for dev-mode requests
#[derive(Debug, Clone, Copy)]
pub struct Actor<'a> {
    pub id: Option<&'a str>,
    pub role: &'a str,
}

impl Actor<'_> {
    /// Accounts ranked above the actor are out of reach
    fn check_reach(&self, target: &User) -> Result<(), RegistryError> {
        if role_rank(&target.role) > role_rank(self.role) {
            return Err(RegistryError::Forbidden(format!(
                "{} accounts can only be changed by a higher role",
                target.role
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Administrative update of an account
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Successful login
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub expires_in: u64,
    pub user: User,
}

pub struct UserService {
    db: Arc<Database>,
    events: Arc<EventBus>,
    tokens: TokenIssuer,
}

impl UserService {
    pub fn new(db: Arc<Database>, events: Arc<EventBus>, tokens: TokenIssuer) -> Self {
        Self { db, events, tokens }
    }

    pub fn signup(&self, input: &SignupInput) -> Result<User, RegistryError> {
        validation::required("name", &input.name)?;
        validation::max_len("name", &input.name, 120)?;
        validation::email("email", &input.email)?;
        validate_password(&input.password)?;

        let hash = hash_password(&input.password)?;
        let user = self.db.transaction(|conn| {
            let (role, status) = if users::count_users(conn)? == 0 {
                (user_roles::SUPER_ADMIN, user_statuses::ACTIVE)
            } else {
                (user_roles::STAFF, user_statuses::PENDING)
            };
            users::create_user(conn, input.name.trim(), &input.email, &hash, role, status)
        })?;

        if user.role == user_roles::SUPER_ADMIN {
            info!(id = %user.id, email = %user.email, "First account bootstrapped as super admin");
        }
        self.events.emit(RegistryEvent::UserSignedUp {
            id: user.id.clone(),
            email: user.email.clone(),
        });
        Ok(user)
    }

    /// Check credentials and issue a session token
    ///
    /// Unknown email and wrong password produce the same error.
    pub fn login(&self, input: &LoginInput) -> Result<Session, RegistryError> {
        let rejected = || RegistryError::Unauthorized("Invalid email or password".into());

        let user = self
            .db
            .with_conn(|conn| users::get_user_by_email(conn, &input.email))?
            .ok_or_else(rejected)?;

        if !verify_password(&input.password, &user.password_hash)? {
            warn!(email = %user.email, "Failed login attempt");
            return Err(rejected());
        }
        if user.status != user_statuses::ACTIVE {
            return Err(RegistryError::Forbidden(format!(
                "Account is {}",
                user.status.to_lowercase()
            )));
        }

        self.db.with_conn(|conn| users::touch_login(conn, &user.id))?;
        let token = self.tokens.issue(&user.id, &user.email, &user.role)?;
        self.events.emit(RegistryEvent::UserLoggedIn { id: user.id.clone() });

        Ok(Session {
            token,
            expires_in: self.tokens.expiry_seconds(),
            user,
        })
    }

    /// Resolve a bearer token to the current, still-active account
    pub fn authenticate(&self, token: &str) -> Result<User, RegistryError> {
        let claims: Claims = self.tokens.verify(token)?;
        let user = self
            .get(&claims.sub)?
            .ok_or_else(|| RegistryError::Unauthorized("Account no longer exists".into()))?;
        if user.status != user_statuses::ACTIVE {
            return Err(RegistryError::Unauthorized(format!(
                "Account is {}",
                user.status.to_lowercase()
            )));
        }
        Ok(user)
    }

    pub fn get(&self, id: &str) -> Result<Option<User>, RegistryError> {
        self.db.with_conn(|conn| users::get_user(conn, id))
    }

    pub fn list(&self, query: &users::UserQuery) -> Result<Vec<User>, RegistryError> {
        self.db.with_conn(|conn| users::list_users(conn, query))
    }

    /// Change an account; nobody grants a role above their own or touches
    /// an account that outranks them
    pub fn update(
        &self,
        id: &str,
        input: &UpdateUserInput,
        actor: Actor<'_>,
    ) -> Result<Option<User>, RegistryError> {
        if let Some(ref name) = input.name {
            validation::required("name", name)?;
        }
        validation::optional(input.role.as_deref(), |r| {
            validation::one_of("role", r, &user_roles::ALL)
        })?;
        if let Some(role) = input.role.as_deref() {
            if role_rank(role) > role_rank(actor.role) {
                return Err(RegistryError::Forbidden(format!(
                    "Role {} may not grant {}",
                    actor.role, role
                )));
            }
        }
        validation::optional(input.status.as_deref(), |s| {
            validation::one_of("status", s, &user_statuses::ALL)
        })?;
        let password_hash = match input.password.as_deref() {
            Some(password) => {
                validate_password(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let changes = UserChanges {
            name: input.name.as_deref().map(str::trim),
            role: input.role.as_deref(),
            status: input.status.as_deref(),
            password_hash: password_hash.as_deref(),
            updated_at: None,
        };
        let user = self.db.with_conn(|conn| {
            let Some(target) = users::get_user(conn, id)? else {
                return Ok(None);
            };
            actor.check_reach(&target)?;
            users::update_user(conn, id, changes)
        })?;

        if let Some(ref user) = user {
            self.events.emit(RegistryEvent::UserUpdated {
                id: user.id.clone(),
                role: user.role.clone(),
                status: user.status.clone(),
            });
        }
        Ok(user)
    }

    /// Deactivate an account; nobody can deactivate themselves
    pub fn deactivate(&self, id: &str, actor: Actor<'_>) -> Result<Option<User>, RegistryError> {
        if actor.id == Some(id) {
            return Err(RegistryError::Conflict("You cannot deactivate your own account".into()));
        }
        let user = self.db.with_conn(|conn| {
            let Some(target) = users::get_user(conn, id)? else {
                return Ok(None);
            };
            actor.check_reach(&target)?;
            users::deactivate_user(conn, id)
        })?;
        if user.is_some() {
            self.events.emit(RegistryEvent::UserDeactivated { id: id.to_string() });
        }
        Ok(user)
    }
}

fn validate_password(password: &str) -> Result<(), RegistryError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(RegistryError::InvalidInput(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> UserService {
        let db = Arc::new(Database::open_in_memory().unwrap());
        UserService::new(db, Arc::new(EventBus::new()), TokenIssuer::new_dev())
    }

    fn admin(id: &str) -> Actor<'_> {
        Actor {
            id: Some(id),
            role: user_roles::SUPER_ADMIN,
        }
    }

    fn signup(name: &str, email: &str) -> SignupInput {
        SignupInput {
            name: name.into(),
            email: email.into(),
            password: "password123".into(),
        }
    }

    #[test]
    fn test_first_signup_bootstraps_admin() {
        let svc = service();
        let first = svc.signup(&signup("Kapitan", "kap@brgy.ph")).unwrap();
        assert_eq!(first.role, user_roles::SUPER_ADMIN);
        assert_eq!(first.status, user_statuses::ACTIVE);

        let second = svc.signup(&signup("Clerk", "clerk@brgy.ph")).unwrap();
        assert_eq!(second.role, user_roles::STAFF);
        assert_eq!(second.status, user_statuses::PENDING);
    }

    #[test]
    fn test_pending_user_cannot_login_until_activated() {
        let svc = service();
        let kap = svc.signup(&signup("Kapitan", "kap@brgy.ph")).unwrap();
        let clerk = svc.signup(&signup("Clerk", "clerk@brgy.ph")).unwrap();

        let login = LoginInput {
            email: "CLERK@brgy.ph".into(),
            password: "password123".into(),
        };
        assert!(matches!(svc.login(&login), Err(RegistryError::Forbidden(_))));

        svc.update(
            &clerk.id,
            &UpdateUserInput {
                status: Some(user_statuses::ACTIVE.into()),
                ..Default::default()
            },
            admin(&kap.id),
        )
        .unwrap();
        let session = svc.login(&login).unwrap();
        assert_eq!(svc.authenticate(&session.token).unwrap().id, clerk.id);
    }

    #[test]
    fn test_bad_credentials() {
        let svc = service();
        svc.signup(&signup("Kapitan", "kap@brgy.ph")).unwrap();
        let wrong = LoginInput {
            email: "kap@brgy.ph".into(),
            password: "nope-nope".into(),
        };
        assert!(matches!(svc.login(&wrong), Err(RegistryError::Unauthorized(_))));
        let unknown = LoginInput {
            email: "who@brgy.ph".into(),
            password: "password123".into(),
        };
        assert!(matches!(svc.login(&unknown), Err(RegistryError::Unauthorized(_))));
    }

    #[test]
    fn test_signup_validation() {
        let svc = service();
        let short = SignupInput {
            password: "short".into(),
            ..signup("A", "a@brgy.ph")
        };
        assert!(matches!(svc.signup(&short), Err(RegistryError::InvalidInput(_))));
        assert!(matches!(
            svc.signup(&signup("A", "not-email")),
            Err(RegistryError::InvalidInput(_))
        ));
        svc.signup(&signup("A", "a@brgy.ph")).unwrap();
        assert!(matches!(
            svc.signup(&signup("B", "A@brgy.ph")),
            Err(RegistryError::Conflict(_))
        ));
    }

    #[test]
    fn test_cannot_deactivate_self() {
        let svc = service();
        let kap = svc.signup(&signup("Kapitan", "kap@brgy.ph")).unwrap();
        assert!(matches!(
            svc.deactivate(&kap.id, admin(&kap.id)),
            Err(RegistryError::Conflict(_))
        ));
        let clerk = svc.signup(&signup("Clerk", "clerk@brgy.ph")).unwrap();
        let gone = svc.deactivate(&clerk.id, admin(&kap.id)).unwrap().unwrap();
        assert_eq!(gone.status, user_statuses::INACTIVE);
    }

    #[test]
    fn test_captain_cannot_reach_above_own_rank() {
        let svc = service();
        let kap = svc.signup(&signup("Super", "super@brgy.ph")).unwrap();
        let captain = svc.signup(&signup("Kapitan", "kapitan@brgy.ph")).unwrap();
        svc.update(
            &captain.id,
            &UpdateUserInput {
                role: Some(user_roles::CAPTAIN.into()),
                status: Some(user_statuses::ACTIVE.into()),
                ..Default::default()
            },
            admin(&kap.id),
        )
        .unwrap();
        let as_captain = Actor {
            id: Some(&captain.id),
            role: user_roles::CAPTAIN,
        };

        let promote = UpdateUserInput {
            role: Some(user_roles::SUPER_ADMIN.into()),
            ..Default::default()
        };
        assert!(matches!(
            svc.update(&captain.id, &promote, as_captain),
            Err(RegistryError::Forbidden(_))
        ));
        let demote = UpdateUserInput {
            role: Some(user_roles::STAFF.into()),
            ..Default::default()
        };
        assert!(matches!(
            svc.update(&kap.id, &demote, as_captain),
            Err(RegistryError::Forbidden(_))
        ));
        assert!(matches!(
            svc.deactivate(&kap.id, as_captain),
            Err(RegistryError::Forbidden(_))
        ));
        assert_eq!(svc.get(&kap.id).unwrap().unwrap().role, user_roles::SUPER_ADMIN);

        let clerk = svc.signup(&signup("Clerk", "clerk@brgy.ph")).unwrap();
        let secretary = UpdateUserInput {
            role: Some(user_roles::SECRETARY.into()),
            ..Default::default()
        };
        let updated = svc.update(&clerk.id, &secretary, as_captain).unwrap().unwrap();
        assert_eq!(updated.role, user_roles::SECRETARY);
    }
}
