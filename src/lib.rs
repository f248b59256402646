pub mod action;
pub mod config;
pub mod deck;
pub mod engine;
pub mod error;
pub mod phase;
pub mod player;
pub mod projector;
pub mod rooms;
pub mod table;

pub use action::{ActionKind, Choice, Intent};
pub use engine::Room;
pub use error::{Rejection, TreasonError};
pub use phase::{RoomPhase, Stage};
pub use projector::{Message, Outbound, Sfx, View};
pub use rooms::{RoomId, Rooms};

use serde::{Deserialize, Serialize};
use crate::Role::{Ambassador, Assassin, Captain, Contessa, Duke};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Duke,
    Assassin,
    Captain,
    Ambassador,
    Contessa,
}

pub static ROLE_VARIANTS: [Role; 5] = [
    Duke,
    Assassin,
    Captain,
    Ambassador,
    Contessa,
];

pub const COPIES_PER_ROLE: usize = 3;

// deck + every hand (dead cards included) + cards drawn into an open exchange
pub const TOKEN_COUNT: usize = ROLE_VARIANTS.len() * COPIES_PER_ROLE;
