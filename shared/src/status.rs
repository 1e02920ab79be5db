//! Status enums for the order fulfillment pipeline
//!
//! These are the only representations of the status columns in the ledger
//! store. Transition predicates live here so that every mutation site checks
//! the same rules: payment reconciliation is forward-only, inventory never
//! moves backward, and a refunded order can never flip back to paid.

use serde::{Deserialize, Serialize};

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created, awaiting payment
    Created,
    /// Payment collected
    Paid,
    /// Payment failed (retryable via a new payment attempt)
    Failed,
    /// Refunded after payment (terminal)
    Refunded,
}

impl OrderStatus {
    /// Parse from database string value (lowercase)
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "created" => Some(Self::Created),
            "paid" => Some(Self::Paid),
            "failed" => Some(Self::Failed),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }

    /// Database string representation (lowercase)
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }

    /// Is `next` a legal forward transition from this status?
    ///
    /// A failed payment attempt may still succeed on retry, so
    /// `failed -> paid` is allowed; `paid -> failed` and any transition out
    /// of `refunded` are not.
    pub fn can_transition_to(&self, next: Self) -> bool {
        match (self, next) {
            (Self::Created, Self::Paid) | (Self::Created, Self::Failed) => true,
            (Self::Failed, Self::Paid) | (Self::Failed, Self::Failed) => true,
            (Self::Paid, Self::Refunded) => true,
            _ => false,
        }
    }
}

/// Payment attempt status, normalized across providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Intent created, awaiting customer action / provider confirmation
    RequiresAction,
    /// Funds collected (terminal)
    Succeeded,
    /// Provider rejected or customer abandoned
    Failed,
}

impl PaymentStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "requires_action" => Some(Self::RequiresAction),
            "succeeded" => Some(Self::Succeeded),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::RequiresAction => "requires_action",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    /// Is `next` a legal forward transition from this status?
    ///
    /// `succeeded` is terminal: at-least-once webhook delivery must never
    /// downgrade a collected payment. A `failed` attempt may later succeed
    /// (late confirmation of a retried 3DS flow).
    pub fn can_transition_to(&self, next: Self) -> bool {
        match (self, next) {
            (Self::RequiresAction, Self::Succeeded) | (Self::RequiresAction, Self::Failed) => true,
            (Self::Failed, Self::Succeeded) => true,
            _ => false,
        }
    }
}

/// Customer-facing eSIM profile status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EsimStatus {
    /// Placeholder, no order attached yet
    Draft,
    /// Pre-registered at order time, awaiting activation
    PendingActivation,
    /// Inventory reserved but activation not finalized
    Reserved,
    /// Activation material attached, not yet confirmed active
    Assigned,
    /// Activated (terminal success)
    Active,
    /// Activation permanently failed
    Failed,
    /// Plan validity window elapsed
    Expired,
}

impl EsimStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "pending_activation" => Some(Self::PendingActivation),
            "reserved" => Some(Self::Reserved),
            "assigned" => Some(Self::Assigned),
            "active" => Some(Self::Active),
            "failed" => Some(Self::Failed),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingActivation => "pending_activation",
            Self::Reserved => "reserved",
            Self::Assigned => "assigned",
            Self::Active => "active",
            Self::Failed => "failed",
            Self::Expired => "expired",
        }
    }

    /// Profiles in these states may enter the activation workflow
    pub fn ready_for_activation(&self) -> bool {
        matches!(self, Self::PendingActivation | Self::Reserved)
    }

    /// Profiles in these states already carry activation material
    pub fn already_provisioned(&self) -> bool {
        matches!(self, Self::Assigned | Self::Active)
    }
}

/// Pool slot status for pre-provisioned eSIMs
///
/// Transitions are strictly forward: available -> reserved -> assigned,
/// with retired reachable from any state for stock pulled out of rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryStatus {
    Available,
    Reserved,
    Assigned,
    Retired,
}

impl InventoryStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "available" => Some(Self::Available),
            "reserved" => Some(Self::Reserved),
            "assigned" => Some(Self::Assigned),
            "retired" => Some(Self::Retired),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Reserved => "reserved",
            Self::Assigned => "assigned",
            Self::Retired => "retired",
        }
    }

    /// Is `next` a legal forward transition from this status?
    pub fn can_transition_to(&self, next: Self) -> bool {
        match (self, next) {
            (Self::Available, Self::Reserved) => true,
            (Self::Reserved, Self::Assigned) => true,
            (_, Self::Retired) => !matches!(self, Self::Retired),
            _ => false,
        }
    }
}

/// Invoice lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Issued,
    Void,
}

impl InvoiceStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "issued" => Some(Self::Issued),
            "void" => Some(Self::Void),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Issued => "issued",
            Self::Void => "void",
        }
    }
}

/// Configured payment provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderKind {
    Mock,
    Stripe,
}

impl ProviderKind {
    /// Parse from database/config string value (uppercase)
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "MOCK" => Some(Self::Mock),
            "STRIPE" => Some(Self::Stripe),
            _ => None,
        }
    }

    /// Database string representation (uppercase)
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Mock => "MOCK",
            Self::Stripe => "STRIPE",
        }
    }
}
