//! Registration wizard state machine: tracks which step the user is on.

use serde::{Deserialize, Serialize};

/// The phases of the registration wizard.
///
/// Progresses linearly: Identity → Professional → Interests → Submitting →
/// Success, then back to Identity once the success screen resets. Users may
/// step back from Professional and Interests at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardPhase {
    Identity,
    Professional,
    Interests,
    Submitting,
    Success,
}

impl WizardPhase {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: WizardPhase) -> bool {
        use WizardPhase::*;
        matches!(
            (self, target),
            (Identity, Professional)
                | (Professional, Interests)
                | (Interests, Submitting)
                | (Submitting, Success)
                | (Success, Identity)
                | (Professional, Identity)
                | (Interests, Professional)
        )
    }

    /// One-based form step shown in the progress bar.
    pub fn step_number(&self) -> u8 {
        match self {
            Self::Identity => 1,
            Self::Professional => 2,
            Self::Interests | Self::Submitting | Self::Success => 3,
        }
    }

    /// Whether the user is still filling in the form.
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Identity | Self::Professional | Self::Interests)
    }

    /// Forward edge from a form step, clamped at the last step.
    ///
    /// Leaving the last step goes through submission, not `next`.
    pub fn next_step(&self) -> WizardPhase {
        match self {
            Self::Identity => Self::Professional,
            Self::Professional | Self::Interests => Self::Interests,
            other => *other,
        }
    }

    /// Backward edge from a form step, clamped at the first step.
    pub fn previous_step(&self) -> WizardPhase {
        match self {
            Self::Identity | Self::Professional => Self::Identity,
            Self::Interests => Self::Professional,
            other => *other,
        }
    }
}

impl Default for WizardPhase {
    fn default() -> Self {
        Self::Identity
    }
}

impl std::fmt::Display for WizardPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Identity => "identity",
            Self::Professional => "professional",
            Self::Interests => "interests",
            Self::Submitting => "submitting",
            Self::Success => "success",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [WizardPhase; 5] = [
        WizardPhase::Identity,
        WizardPhase::Professional,
        WizardPhase::Interests,
        WizardPhase::Submitting,
        WizardPhase::Success,
    ];

    #[test]
    fn valid_transitions() {
        use WizardPhase::*;
        let transitions = [
            (Identity, Professional),
            (Professional, Interests),
            (Interests, Submitting),
            (Submitting, Success),
            (Success, Identity),
            (Professional, Identity),
            (Interests, Professional),
        ];
        for (from, to) in transitions {
            assert!(from.can_transition_to(to), "{from} should transition to {to}");
        }
    }

    #[test]
    fn invalid_transitions() {
        use WizardPhase::*;
        // Skip steps
        assert!(!Identity.can_transition_to(Interests));
        assert!(!Identity.can_transition_to(Submitting));
        assert!(!Professional.can_transition_to(Submitting));
        // No way back out of submission
        assert!(!Submitting.can_transition_to(Interests));
        assert!(!Success.can_transition_to(Interests));
        // Self-transition
        for phase in ALL {
            assert!(!phase.can_transition_to(phase));
        }
    }

    #[test]
    fn step_navigation_is_clamped() {
        use WizardPhase::*;
        assert_eq!(Identity.previous_step(), Identity);
        assert_eq!(Interests.next_step(), Interests);
        assert_eq!(Identity.next_step(), Professional);
        assert_eq!(Professional.next_step(), Interests);
        assert_eq!(Interests.previous_step(), Professional);
        assert_eq!(Professional.previous_step(), Identity);
        assert_eq!(Submitting.next_step(), Submitting);
        assert_eq!(Success.previous_step(), Success);
    }

    #[test]
    fn step_numbers_stay_in_range() {
        for phase in ALL {
            assert!((1..=3).contains(&phase.step_number()));
        }
        assert_eq!(WizardPhase::Identity.step_number(), 1);
        assert_eq!(WizardPhase::Professional.step_number(), 2);
        assert_eq!(WizardPhase::Success.step_number(), 3);
    }

    #[test]
    fn only_form_steps_are_editable() {
        use WizardPhase::*;
        assert!(Identity.is_editable());
        assert!(Interests.is_editable());
        assert!(!Submitting.is_editable());
        assert!(!Success.is_editable());
    }

    #[test]
    fn display_matches_serde() {
        for phase in ALL {
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(
                format!("\"{phase}\""),
                json,
                "Display and serde should match for {phase:?}"
            );
        }
    }
}
