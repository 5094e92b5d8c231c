//! Immutable ledger entries.
//!
//! A `TransactionRecord` is created once inside an atomic unit and never
//! updated or deleted. Its per-kind payload is a closed set of typed
//! variants (`TransactionDetails`) rather than an open map, while the wire
//! shape stays the legacy `type` string plus a flat `metadata` object.

use chrono::{DateTime, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use payvault_core::{
    BillerId, DomainError, DomainResult, Money, TransactionId, TransferGroupId, UserId,
};

/// Ledger entry kind. The string forms are the persisted/wire values.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    #[serde(rename = "topup")]
    TopUp,
    #[serde(rename = "payment")]
    Payment,
    #[serde(rename = "transfer_out")]
    TransferOut,
    #[serde(rename = "transfer_in")]
    TransferIn,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopUp => "topup",
            Self::Payment => "payment",
            Self::TransferOut => "transfer_out",
            Self::TransferIn => "transfer_in",
        }
    }

    /// Presentation name used by history listings (legacy client contract).
    pub fn external_name(&self) -> &'static str {
        match self {
            Self::TopUp => "topup",
            Self::Payment => "bill_payment",
            Self::TransferOut => "transfer_sent",
            Self::TransferIn => "transfer_received",
        }
    }
}

impl FromStr for TransactionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "topup" => Ok(Self::TopUp),
            "payment" => Ok(Self::Payment),
            "transfer_out" => Ok(Self::TransferOut),
            "transfer_in" => Ok(Self::TransferIn),
            other => Err(DomainError::validation(format!(
                "unknown transaction type '{other}'"
            ))),
        }
    }
}

/// Settlement status. Synchronous operations only ever produce `Completed`;
/// the other states exist for future asynchronous settlement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Completed,
    Pending,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Pending => "pending",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(Self::Completed),
            "pending" => Ok(Self::Pending),
            "failed" => Ok(Self::Failed),
            other => Err(DomainError::validation(format!(
                "unknown transaction status '{other}'"
            ))),
        }
    }
}

/// Typed per-kind payload. Each kind has its own required fields; the wire
/// representation is the flat `metadata` map the original clients expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransactionDetails {
    TopUp {
        payment_method: String,
    },
    BillPayment {
        biller_id: BillerId,
        biller_name: String,
        biller_category: String,
        account_number: Option<String>,
    },
    TransferOut {
        recipient_id: UserId,
        recipient_name: String,
        recipient_email: String,
        note: Option<String>,
    },
    TransferIn {
        sender_id: UserId,
        sender_name: String,
        sender_email: String,
        note: Option<String>,
    },
}

impl TransactionDetails {
    pub fn kind(&self) -> TransactionType {
        match self {
            Self::TopUp { .. } => TransactionType::TopUp,
            Self::BillPayment { .. } => TransactionType::Payment,
            Self::TransferOut { .. } => TransactionType::TransferOut,
            Self::TransferIn { .. } => TransactionType::TransferIn,
        }
    }

    /// Flat key/value map for persistence and the wire.
    pub fn metadata(&self) -> JsonValue {
        // Untagged enum of struct variants serializes to a plain map.
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }

    /// Reassemble details from a persisted `(type, metadata)` pair, rejecting
    /// payloads whose shape does not match the declared kind.
    pub fn from_parts(kind: TransactionType, metadata: JsonValue) -> DomainResult<Self> {
        let details: TransactionDetails = serde_json::from_value(metadata)
            .map_err(|e| DomainError::validation(format!("malformed transaction metadata: {e}")))?;
        if details.kind() != kind {
            return Err(DomainError::validation(format!(
                "metadata shape does not match transaction type '{}'",
                kind.as_str()
            )));
        }
        Ok(details)
    }
}

/// Immutable transaction row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub user_id: UserId,
    pub amount: Money,
    pub description: String,
    pub details: TransactionDetails,
    /// Externally citable identifier; globally unique, never changes.
    pub reference: String,
    /// Present on both rows of a transfer, absent otherwise.
    pub transfer_group: Option<TransferGroupId>,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn kind(&self) -> TransactionType {
        self.details.kind()
    }
}

/// Persisted/wire layout: `type` + flat `metadata` instead of the typed enum.
#[derive(Serialize, Deserialize)]
struct RecordRepr {
    id: TransactionId,
    user_id: UserId,
    #[serde(rename = "type")]
    kind: TransactionType,
    amount: Money,
    description: String,
    metadata: JsonValue,
    reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transfer_group: Option<TransferGroupId>,
    status: TransactionStatus,
    created_at: DateTime<Utc>,
}

impl Serialize for TransactionRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RecordRepr {
            id: self.id,
            user_id: self.user_id,
            kind: self.kind(),
            amount: self.amount,
            description: self.description.clone(),
            metadata: self.details.metadata(),
            reference: self.reference.clone(),
            transfer_group: self.transfer_group,
            status: self.status,
            created_at: self.created_at,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TransactionRecord {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = RecordRepr::deserialize(deserializer)?;
        let details = TransactionDetails::from_parts(repr.kind, repr.metadata)
            .map_err(serde::de::Error::custom)?;
        Ok(TransactionRecord {
            id: repr.id,
            user_id: repr.user_id,
            amount: repr.amount,
            description: repr.description,
            details,
            reference: repr.reference,
            transfer_group: repr.transfer_group,
            status: repr.status,
            created_at: repr.created_at,
        })
    }
}
