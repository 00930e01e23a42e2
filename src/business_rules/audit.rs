// Audit Logger
//
// Appends audit entries to the document being mutated, so they are persisted
// together with the change they describe or not at all.

use chrono::Utc;
use serde_json::Value as JsonValue;

use crate::document::{new_id, AuditEntry, Database};

/// What happened, to which entity
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub details: JsonValue,
}

impl AuditRecord {
    pub fn new(action: &str, entity_type: &str, entity_id: &str) -> Self {
        Self {
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            details: JsonValue::Null,
        }
    }

    pub fn with_details(mut self, details: JsonValue) -> Self {
        self.details = details;
        self
    }
}

/// Audit Logger
///
/// Stateless; every call appends one entry to `Database::audit_log`.
pub struct AuditLogger;

impl AuditLogger {
    /// Append a record and return the new entry's id
    pub fn log(db: &mut Database, record: AuditRecord) -> String {
        let id = new_id("audit");
        tracing::debug!(
            action = %record.action,
            entity_type = %record.entity_type,
            entity_id = %record.entity_id,
            "audit entry appended"
        );
        db.audit_log.push(AuditEntry {
            id: id.clone(),
            action: record.action,
            entity_type: Some(record.entity_type),
            entity_id: Some(record.entity_id),
            details: record.details,
            created_at: Utc::now(),
        });
        id
    }

    /// Record a status change on a booking, order or ride
    pub fn log_status_change(db: &mut Database, entity_type: &str, entity_id: &str, from: &str, to: &str) {
        let record = AuditRecord::new("status_changed", entity_type, entity_id)
            .with_details(serde_json::json!({ "from": from, "to": to }));
        Self::log(db, record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_appends_entry() {
        let mut db = Database::default();
        let id = AuditLogger::log(
            &mut db,
            AuditRecord::new("booking_created", "booking", "book_1")
                .with_details(serde_json::json!({"guests": 2})),
        );

        assert_eq!(db.audit_log.len(), 1);
        let entry = &db.audit_log[0];
        assert_eq!(entry.id, id);
        assert!(entry.id.starts_with("audit_"));
        assert_eq!(entry.action, "booking_created");
        assert_eq!(entry.entity_id.as_deref(), Some("book_1"));
        assert_eq!(entry.details["guests"], 2);
    }

    #[test]
    fn test_log_status_change_details() {
        let mut db = Database::default();
        AuditLogger::log_status_change(&mut db, "food_order", "food_o1", "pending", "confirmed");
        assert_eq!(db.audit_log[0].action, "status_changed");
        assert_eq!(db.audit_log[0].details["to"], "confirmed");
    }
}
