use thiserror::Error;
use crate::{ActionKind, Role, TOKEN_COUNT};

/// Why an intent was ignored. A rejection never changes room state and never
/// produces a broadcast; clients racing the latest update are corrected by the
/// next one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("room {0} does not exist")]
    UnknownRoom(String),
    #[error("the game has not started")]
    NotStarted,
    #[error("the game is already running")]
    AlreadyStarted,
    #[error("need at least two seated players to start")]
    NotEnoughPlayers,
    #[error("seat {0} does not exist")]
    NoSuchSeat(usize),
    #[error("seat {0} is empty")]
    EmptySeat(usize),
    #[error("seat {0} is already taken")]
    SeatTaken(usize),
    #[error("seat {0} has been eliminated")]
    Eliminated(usize),
    #[error("it is not seat {0}'s turn")]
    NotYourTurn(usize),
    #[error("another request is still being resolved")]
    RequestPending,
    #[error("nothing is waiting for that intent")]
    WrongPhase,
    #[error("{0} needs {1} coins")]
    InsufficientCoins(ActionKind, u32),
    #[error("{0} needs a living opponent as target, got {1:?}")]
    BadTarget(ActionKind, Option<usize>),
    #[error("seat {0} may not respond right now")]
    CannotRespond(usize),
    #[error("seat {0} has already allowed")]
    AlreadyResponded(usize),
    #[error("that response is not legal in this phase")]
    IllegalResponse,
    #[error("seat {0} may not block this action")]
    CannotBlock(usize),
    #[error("{0:?} does not block {1}")]
    WrongBlocker(Role, ActionKind),
    #[error("card {0} is not a live card")]
    CardNotAlive(usize),
    #[error("kept roles do not match the exchange pool")]
    ExchangeMismatch,
}

#[derive(Debug, Error)]
pub enum TreasonError {
    #[error("rejected: {0}")]
    Rejected(#[from] Rejection),
    #[error("drew from an empty deck")]
    EmptyDeck,
    #[error("counted {0} role tokens, expected {TOKEN_COUNT}")]
    TokenCount(usize),
}

impl TreasonError {
    /// Invariant violations end the room; rejections are routine.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TreasonError::Rejected(_))
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            TreasonError::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{Rejection, TreasonError};

    #[test]
    fn only_invariant_violations_are_fatal() {
        let rejected = TreasonError::from(Rejection::WrongPhase);
        assert!(!rejected.is_fatal());
        assert_eq!(rejected.rejection(), Some(&Rejection::WrongPhase));

        for err in [TreasonError::EmptyDeck, TreasonError::TokenCount(14)] {
            assert!(err.is_fatal());
            assert_eq!(err.rejection(), None);
        }
    }
}
