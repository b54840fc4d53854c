//! Domain events for the audit log
//!
//! Services emit an event after each successful write. The bus is a
//! broadcast channel; with no subscribers events are dropped.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, trace};

/// Events emitted by services
#[derive(Debug, Clone)]
pub enum RegistryEvent {
    // Accounts
    UserSignedUp {
        id: String,
        email: String,
    },
    UserLoggedIn {
        id: String,
    },
    UserUpdated {
        id: String,
        role: String,
        status: String,
    },
    UserDeactivated {
        id: String,
    },

    // Registry
    HouseholdCreated {
        id: String,
        street: String,
    },
    HouseholdUpdated {
        id: String,
    },
    HouseholdArchived {
        id: String,
    },
    ResidentCreated {
        id: String,
        household_id: Option<String>,
    },
    ResidentUpdated {
        id: String,
    },
    ResidentDeleted {
        id: String,
    },
    OfficialSaved {
        id: String,
        position: String,
    },

    // Certificates
    CertificateRequested {
        id: String,
        control_number: String,
        certificate_type: String,
    },
    CertificateUpdated {
        id: String,
    },
    CertificateStatusChanged {
        id: String,
        from: String,
        to: String,
    },
    CertificateDeleted {
        id: String,
    },
    TemplateSaved {
        id: String,
        certificate_type: String,
    },
    TemplateDeleted {
        id: String,
    },

    // Blotter
    CaseFiled {
        id: String,
        case_number: String,
    },
    CaseUpdated {
        id: String,
    },
    CaseStatusChanged {
        id: String,
        from: String,
        to: String,
    },
    CaseDeleted {
        id: String,
    },
    HearingScheduled {
        id: String,
        case_id: String,
        scheduled_at: String,
    },

    // Finance
    AipSaved {
        id: String,
        fiscal_year: i32,
    },
    AipDeleted {
        id: String,
    },
    ProjectSaved {
        id: String,
        project_code: String,
    },
    ProjectDeleted {
        id: String,
    },
    ExpenseRecorded {
        id: String,
        project_id: String,
        amount: f64,
        over_budget: bool,
    },
    ExpenseDeleted {
        id: String,
    },
    MilestoneSaved {
        id: String,
        project_id: String,
    },
    MilestoneDeleted {
        id: String,
    },
    TransactionRecorded {
        id: String,
        reference_number: String,
        amount: f64,
    },
    TransactionStatusChanged {
        id: String,
        from: String,
        to: String,
    },
    TransactionDeleted {
        id: String,
    },

    // Maintenance
    DatabaseSeeded {
        seed: u64,
    },
}

/// Trait for event listeners
pub trait EventListener: Send + Sync {
    fn on_event(&self, event: &RegistryEvent);
}

/// Broadcast bus for registry events
pub struct EventBus {
    sender: broadcast::Sender<RegistryEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all subscribers
    pub fn emit(&self, event: RegistryEvent) {
        trace!(event = ?event, "Emitting registry event");
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes events as audit log lines
pub struct AuditLogListener;

impl EventListener for AuditLogListener {
    fn on_event(&self, event: &RegistryEvent) {
        match event {
            RegistryEvent::UserSignedUp { id, email } => {
                info!(id = %id, email = %email, "Signup awaiting approval");
            }
            RegistryEvent::UserUpdated { id, role, status } => {
                info!(id = %id, role = %role, status = %status, "User updated");
            }
            RegistryEvent::CertificateStatusChanged { id, from, to } => {
                debug!(id = %id, from = %from, to = %to, "Certificate status changed");
            }
            RegistryEvent::CaseStatusChanged { id, from, to } => {
                debug!(id = %id, from = %from, to = %to, "Blotter case status changed");
            }
            RegistryEvent::ExpenseRecorded {
                id,
                project_id,
                amount,
                over_budget,
            } => {
                if *over_budget {
                    info!(id = %id, project = %project_id, amount, "Expense pushed project over budget");
                } else {
                    debug!(id = %id, project = %project_id, amount, "Expense recorded");
                }
            }
            RegistryEvent::TransactionStatusChanged { id, from, to } => {
                debug!(id = %id, from = %from, to = %to, "Transaction status changed");
            }
            _ => {
                debug!(event = ?event, "Registry event");
            }
        }
    }
}

/// Spawn a background task that logs all events
pub fn spawn_logging_listener(event_bus: Arc<EventBus>) -> tokio::task::JoinHandle<()> {
    let mut receiver = event_bus.subscribe();
    let listener = AuditLogListener;

    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => listener.on_event(&event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    debug!(skipped = n, "Audit listener lagged, skipped events");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed, stopping audit listener");
                    break;
                }
            }
        }
    })
}
