//! Reconciliation policy as an ordered table of guard → action pairs.
//!
//! Rules are mutually exclusive and evaluated top to bottom; the first
//! guard that holds decides the action. No match is a legitimate outcome:
//! the processor sends statuses (an informational PENDING, say) that need
//! no order mutation.

use super::event::{EventType, NormalizedEvent, TimelineStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Write the order → charge code ledger entry. The order is untouched.
    RecordChargeCode,
    /// Comment with the timeline context and put the order on hold.
    Hold,
    /// Delete the order as an abandoned cart.
    Cancel,
    /// Register the capture and notify the customer about the invoice.
    Capture,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RecordChargeCode => "record_charge_code",
            Self::Hold => "hold",
            Self::Cancel => "cancel",
            Self::Capture => "capture",
        }
    }
}

pub struct Rule {
    pub name: &'static str,
    pub guard: fn(&NormalizedEvent) -> bool,
    pub action: Action,
}

pub static RULES: [Rule; 4] = [
    Rule {
        name: "charge created",
        guard: |e| e.event_type == EventType::Created,
        action: Action::RecordChargeCode,
    },
    Rule {
        name: "charge unresolved",
        guard: |e| e.timeline_status == TimelineStatus::Unresolved,
        action: Action::Hold,
    },
    Rule {
        name: "charge expired",
        guard: |e| {
            e.event_type == EventType::Failed && e.timeline_status == TimelineStatus::Expired
        },
        action: Action::Cancel,
    },
    Rule {
        name: "charge completed",
        guard: |e| {
            e.event_type == EventType::Confirmed && e.timeline_status == TimelineStatus::Completed
        },
        action: Action::Capture,
    },
];

/// First matching rule, if any.
pub fn decide(event: &NormalizedEvent) -> Option<&'static Rule> {
    RULES.iter().find(|rule| (rule.guard)(event))
}
