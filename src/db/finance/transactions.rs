//! Ledger transactions
//!
//! Entries are editable only while PENDING and deletable only if they never
//! posted (PENDING, REJECTED or CANCELLED).

use diesel::prelude::*;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;

use crate::db::diesel_schema::transactions;
use crate::db::models::{
    current_timestamp, transaction_statuses, NewTransaction, Transaction, TransactionChanges,
};
use crate::db::{like_pattern, new_id};
use crate::error::RegistryError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionInput {
    pub transaction_type: String,
    pub category: String,
    pub amount: f64,
    pub description: String,
    pub transaction_date: String,
    #[serde(default)]
    pub payee: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionInput {
    #[serde(default)]
    pub transaction_type: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub transaction_date: Option<String>,
    #[serde(default, deserialize_with = "crate::db::models::double_option")]
    pub payee: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    #[serde(default, alias = "type")]
    pub transaction_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Inclusive lower bound on `transactionDate` (YYYY-MM-DD)
    #[serde(default)]
    pub from: Option<String>,
    /// Inclusive upper bound on `transactionDate` (YYYY-MM-DD)
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

/// `TXN-YYYYMMDD-XXXXXX` for the given transaction date
pub fn generate_reference<R: Rng>(transaction_date: &str, rng: &mut R) -> String {
    let digits: String = transaction_date
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(8)
        .collect();
    let suffix: String = (0..6)
        .map(|_| (rng.sample(Alphanumeric) as char).to_ascii_uppercase())
        .collect();
    format!("TXN-{}-{}", digits, suffix)
}

pub fn create_transaction(
    conn: &mut SqliteConnection,
    input: &CreateTransactionInput,
    created_by: Option<&str>,
) -> Result<Transaction, RegistryError> {
    let reference = generate_reference(&input.transaction_date, &mut rand::thread_rng());
    insert_transaction(conn, input, &reference, transaction_statuses::PENDING, created_by)
}

/// Insert with a caller-chosen reference and status (seeding and imports)
pub fn insert_transaction(
    conn: &mut SqliteConnection,
    input: &CreateTransactionInput,
    reference_number: &str,
    status: &str,
    created_by: Option<&str>,
) -> Result<Transaction, RegistryError> {
    let id = new_id();
    let now = current_timestamp();
    let new_transaction = NewTransaction {
        id: &id,
        reference_number,
        transaction_type: &input.transaction_type,
        category: input.category.trim(),
        amount: input.amount,
        description: input.description.trim(),
        transaction_date: &input.transaction_date,
        status,
        payee: input.payee.as_deref(),
        created_by,
        approved_by: None,
        created_at: &now,
        updated_at: &now,
    };

    diesel::insert_into(transactions::table)
        .values(&new_transaction)
        .execute(conn)?;
    transactions::table.find(&id).first(conn).map_err(Into::into)
}

pub fn get_transaction(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<Transaction>, RegistryError> {
    transactions::table.find(id).first(conn).optional().map_err(Into::into)
}

pub fn list_transactions(
    conn: &mut SqliteConnection,
    query: &TransactionQuery,
) -> Result<Vec<Transaction>, RegistryError> {
    let mut q = transactions::table.into_boxed();

    if let Some(ref t) = query.transaction_type {
        q = q.filter(transactions::transaction_type.eq(t));
    }
    if let Some(ref status) = query.status {
        q = q.filter(transactions::status.eq(status));
    }
    if let Some(ref category) = query.category {
        q = q.filter(transactions::category.eq(category));
    }
    if let Some(ref from) = query.from {
        q = q.filter(transactions::transaction_date.ge(from));
    }
    if let Some(ref to) = query.to {
        // Dates may carry a time part; compare against the end of the day
        q = q.filter(transactions::transaction_date.le(format!("{}~", to)));
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        q = q.filter(
            transactions::reference_number
                .like(pattern.clone())
                .escape('\\')
                .or(transactions::description.like(pattern.clone()).escape('\\'))
                .or(transactions::payee.like(pattern).escape('\\')),
        );
    }

    q.order((
        transactions::transaction_date.desc(),
        transactions::created_at.desc(),
    ))
    .load(conn)
    .map_err(Into::into)
}

pub fn update_transaction(
    conn: &mut SqliteConnection,
    id: &str,
    input: &UpdateTransactionInput,
) -> Result<Option<Transaction>, RegistryError> {
    let Some(current) = get_transaction(conn, id)? else {
        return Ok(None);
    };
    if current.status != transaction_statuses::PENDING {
        return Err(RegistryError::Conflict(format!(
            "Transaction {} is {} and can no longer be edited",
            current.reference_number, current.status
        )));
    }

    let now = current_timestamp();
    let changes = TransactionChanges {
        transaction_type: input.transaction_type.as_deref(),
        category: input.category.as_deref(),
        amount: input.amount,
        description: input.description.as_deref(),
        transaction_date: input.transaction_date.as_deref(),
        payee: input.payee.as_ref().map(|v| v.as_deref()),
        updated_at: Some(&now),
    };
    diesel::update(transactions::table.find(id))
        .set(&changes)
        .execute(conn)?;
    get_transaction(conn, id)
}

/// Move a transaction along its lifecycle; APPROVED records the approver
pub fn update_status(
    conn: &mut SqliteConnection,
    id: &str,
    status: &str,
    actor: Option<&str>,
) -> Result<Option<Transaction>, RegistryError> {
    conn.transaction(|conn| {
        let Some(current) = get_transaction(conn, id)? else {
            return Ok(None);
        };
        if current.status == status {
            return Ok(Some(current));
        }
        if !transaction_statuses::can_transition(&current.status, status) {
            return Err(RegistryError::InvalidTransition {
                entity: "transaction",
                from: current.status,
                to: status.to_string(),
            });
        }

        let now = current_timestamp();
        let approved_by = if status == transaction_statuses::APPROVED {
            actor.or(current.approved_by.as_deref())
        } else {
            current.approved_by.as_deref()
        };

        diesel::update(transactions::table.find(id))
            .set((
                transactions::status.eq(status),
                transactions::approved_by.eq(approved_by),
                transactions::updated_at.eq(&now),
            ))
            .execute(conn)?;
        get_transaction(conn, id)
    })
}

pub fn delete_transaction(conn: &mut SqliteConnection, id: &str) -> Result<bool, RegistryError> {
    let Some(current) = get_transaction(conn, id)? else {
        return Ok(false);
    };
    if !transaction_statuses::is_deletable(&current.status) {
        return Err(RegistryError::Conflict(format!(
            "Transaction {} is {} and cannot be deleted",
            current.reference_number, current.status
        )));
    }
    let deleted = diesel::delete(transactions::table.find(id)).execute(conn)?;
    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::transaction_types;
    use crate::db::test_conn as setup;
    use rand::SeedableRng;

    fn input(t: &str, amount: f64, date: &str) -> CreateTransactionInput {
        CreateTransactionInput {
            transaction_type: t.into(),
            category: "General Fund".into(),
            amount,
            description: "Entry".into(),
            transaction_date: date.into(),
            payee: None,
        }
    }

    #[test]
    fn test_reference_format() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let reference = generate_reference("2024-05-17", &mut rng);
        assert!(reference.starts_with("TXN-20240517-"));
        let suffix = &reference["TXN-20240517-".len()..];
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_lifecycle_and_guards() {
        let mut conn = setup();
        let txn = create_transaction(
            &mut conn,
            &input(transaction_types::INCOME, 500.0, "2024-05-17"),
            Some("user-1"),
        )
        .unwrap();
        assert_eq!(txn.status, transaction_statuses::PENDING);

        let err = update_status(&mut conn, &txn.id, transaction_statuses::COMPLETED, None).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidTransition { .. }));

        let approved = update_status(&mut conn, &txn.id, transaction_statuses::APPROVED, Some("captain"))
            .unwrap()
            .unwrap();
        assert_eq!(approved.approved_by.as_deref(), Some("captain"));

        let edit = update_transaction(
            &mut conn,
            &txn.id,
            &UpdateTransactionInput {
                amount: Some(1.0),
                ..Default::default()
            },
        );
        assert!(matches!(edit, Err(RegistryError::Conflict(_))));
        assert!(matches!(delete_transaction(&mut conn, &txn.id), Err(RegistryError::Conflict(_))));

        let completed = update_status(&mut conn, &txn.id, transaction_statuses::COMPLETED, None)
            .unwrap()
            .unwrap();
        assert_eq!(completed.status, transaction_statuses::COMPLETED);
    }

    #[test]
    fn test_date_range_filter() {
        let mut conn = setup();
        create_transaction(&mut conn, &input(transaction_types::INCOME, 1.0, "2024-01-10"), None).unwrap();
        create_transaction(&mut conn, &input(transaction_types::EXPENSE, 2.0, "2024-02-10"), None).unwrap();
        create_transaction(&mut conn, &input(transaction_types::EXPENSE, 3.0, "2024-03-10"), None).unwrap();

        let feb = list_transactions(
            &mut conn,
            &TransactionQuery {
                from: Some("2024-02-01".into()),
                to: Some("2024-02-29".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(feb.len(), 1);
        assert_eq!(feb[0].amount, 2.0);

        let expenses = list_transactions(
            &mut conn,
            &TransactionQuery {
                transaction_type: Some(transaction_types::EXPENSE.into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(expenses.len(), 2);
    }

    #[test]
    fn test_pending_can_be_deleted() {
        let mut conn = setup();
        let txn = create_transaction(&mut conn, &input(transaction_types::INCOME, 1.0, "2024-01-10"), None)
            .unwrap();
        assert!(delete_transaction(&mut conn, &txn.id).unwrap());
        assert!(!delete_transaction(&mut conn, &txn.id).unwrap());
    }
}
