use thiserror::Error;

use crate::combat::log::ActionType;
use crate::combat::CombatPhase;
use crate::combatant::CombatantId;

pub type Result<T> = std::result::Result<T, CombatError>;

/// Structured failures reported by the notation parser and the combat engine.
///
/// None of these are fatal: each describes a precondition the caller can fix
/// and retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombatError {
    #[error("invalid dice expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    #[error("unknown combatant {0}")]
    InvalidCombatant(CombatantId),

    #[error("{combatant} has no {resource} available")]
    NoActionAvailable {
        combatant: String,
        resource: ActionType,
    },

    #[error("combat is not active (phase: {0})")]
    CombatNotActive(CombatPhase),

    #[error("it is not {combatant}'s turn")]
    NotYourTurn {
        combatant: CombatantId,
        current: Option<CombatantId>,
    },

    #[error("cannot start combat without combatants")]
    NoCombatants,

    #[error("cannot move combat from {from} to {to}")]
    InvalidTransition { from: CombatPhase, to: CombatPhase },
}

impl CombatError {
    pub(crate) fn invalid_expression(expression: &str, reason: impl Into<String>) -> Self {
        CombatError::InvalidExpression {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }
}
