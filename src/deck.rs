use rand::seq::SliceRandom;
use rand::Rng;
use crate::error::TreasonError;
use crate::{Role, COPIES_PER_ROLE, ROLE_VARIANTS};

/// The court deck. Order carries no meaning beyond the last shuffle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<Role>,
}

impl Deck {
    /// A complete deck of every role, shuffled.
    pub fn full<R: Rng + Sized>(rng: &mut R) -> Self {
        let mut deck = Deck {
            cards: ROLE_VARIANTS.iter()
                .flat_map(|&role| std::iter::repeat(role).take(COPIES_PER_ROLE))
                .collect(),
        };
        deck.shuffle(rng);
        deck
    }

    pub fn shuffle<R: Rng + Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    pub fn draw(&mut self) -> Result<Role, TreasonError> {
        self.cards.pop().ok_or(TreasonError::EmptyDeck)
    }

    pub fn return_and_reshuffle<R, I>(&mut self, roles: I, rng: &mut R)
    where
        R: Rng + Sized,
        I: IntoIterator<Item = Role>,
    {
        self.cards.extend(roles);
        self.shuffle(rng);
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn count(&self, role: Role) -> usize {
        self.cards.iter().filter(|&&card| card == role).count()
    }

    // pulls a specific role out so tests can hand it to a player
    #[cfg(test)]
    pub(crate) fn take(&mut self, role: Role) -> Option<Role> {
        let idx = self.cards.iter().position(|&card| card == role)?;
        Some(self.cards.remove(idx))
    }
}
