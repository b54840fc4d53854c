//! Service layer
//!
//! Services validate input, call the repositories through the shared
//! [`Database`] and announce changes on the [`EventBus`]. The HTTP layer
//! talks only to these types.

pub mod blotter_service;
pub mod certificate_service;
pub mod events;
pub mod finance_service;
pub mod registry_service;
pub mod report_service;
pub mod response;
pub mod user_service;
pub mod validation;

use std::sync::Arc;

use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::db::Database;
use crate::error::RegistryError;

pub use blotter_service::BlotterService;
pub use certificate_service::CertificateService;
pub use events::{spawn_logging_listener, AuditLogListener, EventBus, EventListener, RegistryEvent};
pub use finance_service::FinanceService;
pub use registry_service::RegistryService;
pub use report_service::{ReportQuery, ReportService};
pub use user_service::{Actor, Session, UserService};

/// Every service wired to one database and event bus
pub struct Services {
    pub config: Arc<Config>,
    pub db: Arc<Database>,
    pub events: Arc<EventBus>,
    pub users: UserService,
    pub registry: RegistryService,
    pub certificates: CertificateService,
    pub blotter: BlotterService,
    pub finance: FinanceService,
    pub reports: ReportService,
}

impl Services {
    pub fn new(db: Arc<Database>, config: Arc<Config>) -> Result<Self, RegistryError> {
        Self::with_events(db, config, Arc::new(EventBus::new()))
    }

    pub fn with_events(
        db: Arc<Database>,
        config: Arc<Config>,
        events: Arc<EventBus>,
    ) -> Result<Self, RegistryError> {
        let tokens = TokenIssuer::from_config(&config)?;
        Ok(Self {
            users: UserService::new(db.clone(), events.clone(), tokens),
            registry: RegistryService::new(db.clone(), events.clone(), config.clone()),
            certificates: CertificateService::new(db.clone(), events.clone(), config.clone()),
            blotter: BlotterService::new(db.clone(), events.clone()),
            finance: FinanceService::new(db.clone(), events.clone(), config.clone()),
            reports: ReportService::new(db.clone()),
            config,
            db,
            events,
        })
    }
}
