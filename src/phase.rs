use std::collections::BTreeSet;
use serde::Serialize;
use crate::{ActionKind, Role};

/// Negotiation stage of a contested action.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    // anyone but the actor may dispute the claimed role
    ChallengeAction,
    // a counter-role may be claimed
    BlockAction,
    // anyone but the blocker may dispute the block
    ChallengeBlock,
}

/// Seats that have allowed the current stage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Responded(BTreeSet<usize>);

impl Responded {
    /// Returns false if the seat had already responded.
    pub fn insert(&mut self, seat: usize) -> bool {
        self.0.insert(seat)
    }

    pub fn contains(&self, seat: usize) -> bool {
        self.0.contains(&seat)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn covers(&self, seats: &[usize]) -> bool {
        seats.iter().all(|seat| self.0.contains(seat))
    }

    pub fn clear(&mut self) {
        self.0.clear()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub seat: usize,
    pub claim: Role,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingAction {
    pub kind: ActionKind,
    pub actor: usize,
    pub target: Option<usize>,
    pub stage: Stage,
    pub block: Option<Block>,
    pub responded: Responded,
}

impl PendingAction {
    pub fn new(kind: ActionKind, actor: usize, target: Option<usize>) -> Self {
        // an action that claims no role can't be challenged, only blocked
        let stage = if kind.claimed_role().is_some() {
            Stage::ChallengeAction
        } else {
            Stage::BlockAction
        };

        PendingAction {
            kind,
            actor,
            target,
            stage,
            block: None,
            responded: Responded::default(),
        }
    }

    /// The seat whose claim the current stage is about.
    pub fn subject(&self) -> usize {
        match (self.stage, self.block) {
            (Stage::ChallengeBlock, Some(block)) => block.seat,
            _ => self.actor,
        }
    }

    pub fn enter(&mut self, stage: Stage) {
        self.stage = stage;
        self.responded.clear();
    }
}

/// What happens once a loss has been fully resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Continuation {
    NextTurn,
    // the retained action resumes execution
    Execute(PendingAction),
    // the contested action is cancelled
    Abort,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscardRequest {
    pub victim: usize,
    pub reason: String,
    pub continuation: Continuation,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExchangeRequest {
    pub actor: usize,
    // live roles first, then the freshly drawn ones
    pub pool: Vec<Role>,
    pub keep: usize,
}

impl ExchangeRequest {
    /// Roles drawn from the deck that are in neither the deck nor a hand.
    pub fn drawn(&self) -> usize {
        self.pool.len() - self.keep
    }
}

/// At most one request is ever open per room.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RoomPhase {
    #[default]
    Idle,
    AwaitingResponse(PendingAction),
    AwaitingDiscard(DiscardRequest),
    AwaitingExchange(ExchangeRequest),
}

impl RoomPhase {
    pub fn label(&self) -> &'static str {
        match self {
            RoomPhase::Idle => "idle",
            RoomPhase::AwaitingResponse(_) => "awaiting_response",
            RoomPhase::AwaitingDiscard(_) => "awaiting_discard",
            RoomPhase::AwaitingExchange(_) => "awaiting_exchange",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, RoomPhase::Idle)
    }

    /// The action under negotiation, if any.
    pub fn negotiating(&self) -> Option<&PendingAction> {
        match self {
            RoomPhase::AwaitingResponse(pending) => Some(pending),
            _ => None,
        }
    }

    /// The action that is either under negotiation or suspended behind a
    /// discard it is waiting to resume after.
    pub fn pending(&self) -> Option<&PendingAction> {
        match self {
            RoomPhase::AwaitingResponse(pending) => Some(pending),
            RoomPhase::AwaitingDiscard(DiscardRequest { continuation: Continuation::Execute(pending), .. }) => Some(pending),
            _ => None,
        }
    }

    pub fn discard(&self) -> Option<&DiscardRequest> {
        match self {
            RoomPhase::AwaitingDiscard(request) => Some(request),
            _ => None,
        }
    }

    pub fn exchange(&self) -> Option<&ExchangeRequest> {
        match self {
            RoomPhase::AwaitingExchange(request) => Some(request),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::phase::{Block, PendingAction, Responded, Stage};
    use crate::ActionKind;
    use crate::Role::Duke;

    #[test]
    fn unclaimed_actions_start_at_block() {
        assert_eq!(PendingAction::new(ActionKind::ForeignAid, 0, None).stage, Stage::BlockAction);
        assert_eq!(PendingAction::new(ActionKind::Tax, 0, None).stage, Stage::ChallengeAction);
        assert_eq!(PendingAction::new(ActionKind::Steal, 0, Some(1)).stage, Stage::ChallengeAction);
    }

    #[test]
    fn entering_a_stage_resets_the_quorum() {
        let mut pending = PendingAction::new(ActionKind::ForeignAid, 0, None);
        pending.responded.insert(2);
        assert_eq!(pending.subject(), 0);

        pending.block = Some(Block { seat: 1, claim: Duke });
        pending.enter(Stage::ChallengeBlock);

        assert!(pending.responded.is_empty());
        assert_eq!(pending.subject(), 1);
    }

    #[test]
    fn responded_is_a_set() {
        let mut responded = Responded::default();
        assert!(responded.insert(3));
        assert!(!responded.insert(3));
        assert_eq!(responded.len(), 1);
        assert!(responded.covers(&[3]));
        assert!(!responded.covers(&[1, 3]));
    }
}
