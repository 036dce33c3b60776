//! Presale phase derivation and the phase → action table.
//!
//! `PHASE_TABLE` is the single place that says which action a phase permits
//! and how it is labelled; the dispatcher and the display rows both read it.

use crate::protocols::presale::types::PresaleAction;
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete presale phase as reported by `presaleStatus()`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Inactive,
    Active,
    Successful,
    Failed,
    /// A status code outside 0..=3, kept verbatim so a contract fault stays visible
    Unrecognized(U256),
}

/// Visual tone of the phase chip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tone {
    Success,
    Error,
    Default,
}

/// Presentation and gating for one phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseDescriptor {
    pub label: &'static str,
    pub banner: Option<&'static str>,
    pub tone: Tone,
    pub action: Option<PresaleAction>,
}

/// Indexed by status code
pub const PHASE_TABLE: [PhaseDescriptor; 4] = [
    PhaseDescriptor {
        label: "Sale is not Active",
        banner: None,
        tone: Tone::Default,
        action: None,
    },
    PhaseDescriptor {
        label: "Sale is Active",
        banner: Some("Private-sale is started."),
        tone: Tone::Success,
        action: Some(PresaleAction::Buy),
    },
    PhaseDescriptor {
        label: "Sale is Successful",
        banner: Some("Private-sale is finished with successful."),
        tone: Tone::Success,
        action: Some(PresaleAction::Claim),
    },
    PhaseDescriptor {
        label: "Sale is failed",
        banner: Some("Private-sale is finished with failure."),
        tone: Tone::Error,
        action: Some(PresaleAction::Withdraw),
    },
];

/// Map the raw `presaleStatus()` value to a phase.
///
/// Codes outside 0..=3 are not clamped; they come back as
/// `Phase::Unrecognized(raw)`.
pub fn derive_phase(raw: U256) -> Phase {
    if raw > U256::from(3u8) {
        return Phase::Unrecognized(raw);
    }
    match raw.to::<u8>() {
        0 => Phase::Inactive,
        1 => Phase::Active,
        2 => Phase::Successful,
        3 => Phase::Failed,
        _ => Phase::Unrecognized(raw),
    }
}

impl Phase {
    /// The raw status code this phase was derived from
    pub fn code(&self) -> U256 {
        match self {
            Phase::Inactive => U256::from(0u8),
            Phase::Active => U256::from(1u8),
            Phase::Successful => U256::from(2u8),
            Phase::Failed => U256::from(3u8),
            Phase::Unrecognized(raw) => *raw,
        }
    }

    /// Table entry; unrecognized codes fall back to the inactive entry
    pub fn descriptor(&self) -> &'static PhaseDescriptor {
        match self {
            Phase::Inactive | Phase::Unrecognized(_) => &PHASE_TABLE[0],
            Phase::Active => &PHASE_TABLE[1],
            Phase::Successful => &PHASE_TABLE[2],
            Phase::Failed => &PHASE_TABLE[3],
        }
    }

    /// The single action this phase permits
    pub fn permitted_action(&self) -> Option<PresaleAction> {
        self.descriptor().action
    }

    pub fn label(&self) -> &'static str {
        self.descriptor().label
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Phase::Unrecognized(_))
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Inactive => write!(f, "Inactive"),
            Phase::Active => write!(f, "Active"),
            Phase::Successful => write!(f, "Successful"),
            Phase::Failed => write!(f, "Failed"),
            Phase::Unrecognized(raw) => write!(f, "Unrecognized({})", raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_map_exactly() {
        assert_eq!(derive_phase(U256::from(0u8)), Phase::Inactive);
        assert_eq!(derive_phase(U256::from(1u8)), Phase::Active);
        assert_eq!(derive_phase(U256::from(2u8)), Phase::Successful);
        assert_eq!(derive_phase(U256::from(3u8)), Phase::Failed);
    }

    #[test]
    fn test_out_of_range_codes_pass_through() {
        for raw in [U256::from(4u8), U256::from(255u16), U256::MAX] {
            let phase = derive_phase(raw);
            assert_eq!(phase, Phase::Unrecognized(raw));
            assert_eq!(phase.code(), raw);
            assert!(!phase.is_recognized());
        }
    }

    /// Unrecognized codes render with the inactive label and gate nothing.
    /// Whether the source meant this fallback or masked a contract fault is
    /// unresolved; this pins the current behavior.
    #[test]
    fn test_out_of_range_code_falls_back_to_inactive_label() {
        let phase = derive_phase(U256::from(7u8));
        assert_eq!(phase.label(), "Sale is not Active");
        assert_eq!(phase.permitted_action(), None);
        assert_eq!(phase.descriptor().tone, Tone::Default);
    }

    #[test]
    fn test_each_gating_phase_permits_exactly_one_action() {
        assert_eq!(Phase::Inactive.permitted_action(), None);
        assert_eq!(Phase::Active.permitted_action(), Some(PresaleAction::Buy));
        assert_eq!(
            Phase::Successful.permitted_action(),
            Some(PresaleAction::Claim)
        );
        assert_eq!(
            Phase::Failed.permitted_action(),
            Some(PresaleAction::Withdraw)
        );
    }

    #[test]
    fn test_code_round_trips_through_table() {
        for (code, descriptor) in PHASE_TABLE.iter().enumerate() {
            let phase = derive_phase(U256::from(code as u64));
            assert_eq!(phase.descriptor(), descriptor);
            assert_eq!(phase.code(), U256::from(code as u64));
        }
    }
}
