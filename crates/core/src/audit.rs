//! Tamper-evident audit log of attribute changes.
//!
//! Every entry carries a SHA-256 integrity hash over its content chained to
//! the previous entry's hash, so editing or removing an earlier entry breaks
//! verification of everything after it. Values of attributes whose names
//! look sensitive are redacted before they are stored.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::EngineConfig;
use crate::history::{ChangeRecord, ChangeSink, HistoryQuery};
use crate::value::AttributeValue;

// ---------------------------------------------------------------------------
// Integrity hash computation
// ---------------------------------------------------------------------------

/// Known seed value for the first entry in the hash chain.
const CHAIN_SEED: &str = "ATTRIBUTE_AUDIT_CHAIN_SEED_V1";

fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Compute the integrity hash for an entry.
///
/// `prev_hash` is the hash of the previous entry, or `None` for the first
/// entry in the chain (which uses a known seed value). `entry_data` is the
/// canonical JSON of the entry's change.
pub fn compute_integrity_hash(prev_hash: Option<&str>, entry_data: &str) -> String {
    let prev = prev_hash.unwrap_or(CHAIN_SEED);
    sha256_hex(format!("{prev}|{entry_data}").as_bytes())
}

// ---------------------------------------------------------------------------
// Sensitive value redaction
// ---------------------------------------------------------------------------

/// Attribute name fragments whose values are never stored in clear.
pub const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "token",
    "secret",
    "api_key",
    "private_key",
    "credential",
];

pub const REDACTED: &str = "[REDACTED]";

/// Whether an attribute name contains a sensitive fragment
/// (case-insensitive).
pub fn is_sensitive(attribute: &str) -> bool {
    let lower = attribute.to_lowercase();
    SENSITIVE_FIELDS.iter().any(|f| lower.contains(f))
}

fn redact(mut change: ChangeRecord) -> ChangeRecord {
    if is_sensitive(&change.attribute) {
        change.old_value = change
            .old_value
            .map(|_| AttributeValue::Text(REDACTED.to_string()));
        change.new_value = AttributeValue::Text(REDACTED.to_string());
    }
    change
}

// ---------------------------------------------------------------------------
// AuditLog
// ---------------------------------------------------------------------------

/// One audited change and its chain hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub change: ChangeRecord,
    pub integrity_hash: String,
}

#[derive(Debug, Clone)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
    redact_values: bool,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(true)
    }
}

impl AuditLog {
    pub fn new(redact_values: bool) -> Self {
        Self {
            entries: Vec::new(),
            redact_values,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.redact_audit_values)
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hash of the most recent entry.
    pub fn head(&self) -> Option<&str> {
        self.entries.last().map(|e| e.integrity_hash.as_str())
    }

    /// Index of the first entry whose hash does not match its content and
    /// predecessor.
    pub fn first_broken_entry(&self) -> Option<usize> {
        let mut prev: Option<&str> = None;
        for (i, entry) in self.entries.iter().enumerate() {
            let expected = compute_integrity_hash(prev, &canonical(&entry.change));
            if expected != entry.integrity_hash {
                return Some(i);
            }
            prev = Some(entry.integrity_hash.as_str());
        }
        None
    }

    pub fn verify_chain(&self) -> bool {
        self.first_broken_entry().is_none()
    }

    #[cfg(test)]
    fn entries_mut(&mut self) -> &mut Vec<AuditEntry> {
        &mut self.entries
    }
}

/// Canonical serialization of a change for hashing.
///
/// Struct fields serialize in declaration order and maps are `BTreeMap`s, so
/// the output is deterministic. Serialization cannot fail: every map key is
/// a `String` and `serde_json` writes non-finite floats as `null`.
fn canonical(change: &ChangeRecord) -> String {
    serde_json::to_string(change).unwrap_or_default()
}

impl ChangeSink for AuditLog {
    fn log_change(&mut self, change: ChangeRecord) {
        let change = if self.redact_values { redact(change) } else { change };
        let integrity_hash = compute_integrity_hash(self.head(), &canonical(&change));
        tracing::debug!(
            attribute = %change.attribute,
            changed_by = %change.changed_by,
            hash = %integrity_hash,
            "Audit entry appended"
        );
        self.entries.push(AuditEntry {
            change,
            integrity_hash,
        });
    }
}

impl HistoryQuery for AuditLog {
    fn history(&self, attribute: &str) -> Vec<&ChangeRecord> {
        self.entries
            .iter()
            .map(|e| &e.change)
            .filter(|c| c.attribute == attribute)
            .collect()
    }

    fn full_history(&self) -> Vec<&ChangeRecord> {
        self.entries.iter().map(|e| &e.change).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
