use serde::Serialize;
use crate::Role;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Card {
    pub role: Role,
    // a dead card stays in the hand face up for everyone to see
    pub alive: bool,
}

impl Card {
    pub fn new(role: Role) -> Self {
        Card { role, alive: true }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    pub coins: u32,
    pub hand: Vec<Card>,
    pub alive: bool,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Player {
            name: name.into(),
            coins: 0,
            hand: Vec::with_capacity(2),
            alive: true,
        }
    }

    /// Indexes of the cards still in play.
    pub fn live_cards(&self) -> impl Iterator<Item = usize> + '_ {
        self.hand
            .iter()
            .enumerate()
            .filter_map(|(idx, card)| if card.alive { Some(idx) } else { None })
    }

    pub fn live_roles(&self) -> Vec<Role> {
        self.hand.iter().filter(|card| card.alive).map(|card| card.role).collect()
    }

    pub fn live_count(&self) -> usize {
        self.hand.iter().filter(|card| card.alive).count()
    }

    /// First live card holding `role`, by hand position.
    pub fn find_live(&self, role: Role) -> Option<usize> {
        self.hand.iter().position(|card| card.alive && card.role == role)
    }

    /// Flips a live card face up. Returns the revealed role.
    pub fn kill(&mut self, card_idx: usize) -> Option<Role> {
        let card = self.hand.get_mut(card_idx).filter(|card| card.alive)?;
        card.alive = false;
        Some(card.role)
    }
}
