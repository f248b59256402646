use std::fmt::{Debug, Display, Formatter};
use serde::{Deserialize, Serialize};
use crate::Role;
use crate::Role::{Ambassador, Assassin, Captain, Contessa, Duke};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Income,
    ForeignAid,
    Tax,
    Steal,
    Assassinate,
    Exchange,
    Coup,
}

pub static ACTION_VARIANTS: [ActionKind; 7] = [
    ActionKind::Income,
    ActionKind::ForeignAid,
    ActionKind::Tax,
    ActionKind::Steal,
    ActionKind::Assassinate,
    ActionKind::Exchange,
    ActionKind::Coup,
];

pub const COUP_COST: u32 = 7;
pub const ASSASSINATE_COST: u32 = 3;

impl ActionKind {
    /// The role an actor implicitly claims by declaring this action.
    pub fn claimed_role(self) -> Option<Role> {
        match self {
            ActionKind::Tax => Some(Duke),
            ActionKind::Steal => Some(Captain),
            ActionKind::Assassinate => Some(Assassin),
            ActionKind::Exchange => Some(Ambassador),
            ActionKind::Income | ActionKind::ForeignAid | ActionKind::Coup => None,
        }
    }

    /// Roles that may be claimed to block this action. The first entry is the
    /// claim assumed when a block names no role.
    pub fn blockers(self) -> &'static [Role] {
        match self {
            ActionKind::ForeignAid => &[Duke],
            ActionKind::Assassinate => &[Contessa],
            ActionKind::Steal => &[Captain, Ambassador],
            ActionKind::Income | ActionKind::Tax | ActionKind::Exchange | ActionKind::Coup => &[],
        }
    }

    /// Immediate actions resolve on declaration without any negotiation.
    pub fn is_immediate(self) -> bool {
        matches!(self, ActionKind::Income | ActionKind::Coup)
    }

    pub fn is_targeted(self) -> bool {
        matches!(self, ActionKind::Steal | ActionKind::Assassinate | ActionKind::Coup)
    }

    /// Coins the actor must hold to declare this action.
    pub fn cost(self) -> u32 {
        match self {
            ActionKind::Coup => COUP_COST,
            ActionKind::Assassinate => ASSASSINATE_COST,
            _ => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ActionKind::Income => "INCOME",
            ActionKind::ForeignAid => "FOREIGN_AID",
            ActionKind::Tax => "TAX",
            ActionKind::Steal => "STEAL",
            ActionKind::Assassinate => "ASSASSINATE",
            ActionKind::Exchange => "EXCHANGE",
            ActionKind::Coup => "COUP",
        }
    }
}

impl Display for ActionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Choice {
    Challenge,
    Allow,
    Block,
}

/// An inbound request from one seat. The seat itself comes from the
/// connection, never from the payload.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    DeclareAction {
        kind: ActionKind,
        #[serde(default)]
        target: Option<usize>,
    },
    Respond {
        choice: Choice,
        #[serde(default)]
        role: Option<Role>,
    },
    Discard {
        index: usize,
    },
    FinishExchange {
        kept: Vec<Role>,
    },
}

impl Intent {
    pub fn declare(kind: ActionKind) -> Self {
        Intent::DeclareAction { kind, target: None }
    }

    pub fn declare_against(kind: ActionKind, target: usize) -> Self {
        Intent::DeclareAction { kind, target: Some(target) }
    }

    pub fn allow() -> Self {
        Intent::Respond { choice: Choice::Allow, role: None }
    }

    pub fn challenge() -> Self {
        Intent::Respond { choice: Choice::Challenge, role: None }
    }

    pub fn block(role: Option<Role>) -> Self {
        Intent::Respond { choice: Choice::Block, role }
    }
}

impl Debug for Intent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Intent::DeclareAction { kind, target: Some(target) } => {
                f.write_fmt(format_args!("declares {kind} against seat {target}"))
            }
            Intent::DeclareAction { kind, target: None } => {
                f.write_fmt(format_args!("declares {kind}"))
            }
            Intent::Respond { choice: Choice::Block, role: Some(role) } => {
                f.write_fmt(format_args!("blocks with {:?}", role))
            }
            Intent::Respond { choice, .. } => {
                f.write_fmt(format_args!("responds {:?}", choice))
            }
            Intent::Discard { index } => {
                f.write_fmt(format_args!("discards card {index}"))
            }
            Intent::FinishExchange { kept } => {
                f.write_fmt(format_args!("keeps {:?}", kept))
            }
        }
    }
}
