use rand::Rng;
use crate::deck::Deck;
use crate::error::{Rejection, TreasonError};
use crate::phase::RoomPhase;
use crate::player::{Card, Player};
use crate::{Role, TOKEN_COUNT};

pub const SEAT_COUNT: usize = 6;
pub const STARTING_COINS: u32 = 2;
pub const HAND_SIZE: usize = 2;

/// Everything one room knows about its game.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    seats: [Option<Player>; SEAT_COUNT],
    turn: usize,
    pub(crate) deck: Deck,
    started: bool,
    pub(crate) phase: RoomPhase,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seat(&mut self, seat: usize, name: impl Into<String>) -> Result<(), Rejection> {
        if self.started {
            return Err(Rejection::AlreadyStarted);
        }
        let slot = self.seats.get_mut(seat).ok_or(Rejection::NoSuchSeat(seat))?;
        if slot.is_some() {
            return Err(Rejection::SeatTaken(seat));
        }
        *slot = Some(Player::new(name));
        Ok(())
    }

    pub fn unseat(&mut self, seat: usize) -> Result<Player, Rejection> {
        if self.started {
            return Err(Rejection::AlreadyStarted);
        }
        self.seats
            .get_mut(seat)
            .ok_or(Rejection::NoSuchSeat(seat))?
            .take()
            .ok_or(Rejection::EmptySeat(seat))
    }

    /// Fresh deck, two cards and two coins for every seated player.
    pub fn deal<R: Rng + Sized>(&mut self, rng: &mut R) -> Result<(), TreasonError> {
        if self.started {
            return Err(Rejection::AlreadyStarted.into());
        }
        let first = self.seated().next().map(|(seat, _)| seat);
        let Some(first) = first.filter(|_| self.seated().count() >= 2) else {
            return Err(Rejection::NotEnoughPlayers.into());
        };

        self.deck = Deck::full(rng);
        for player in self.seats.iter_mut().flatten() {
            player.hand.clear();
            for _ in 0..HAND_SIZE {
                player.hand.push(Card::new(self.deck.draw()?));
            }
            player.coins = STARTING_COINS;
            player.alive = true;
        }

        self.turn = first;
        self.phase = RoomPhase::Idle;
        self.started = true;
        Ok(())
    }

    /// Back to the lobby after a win; seated players stay for a rematch.
    pub fn reset(&mut self) {
        self.started = false;
        self.phase = RoomPhase::Idle;
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn turn(&self) -> usize {
        self.turn
    }

    pub fn phase(&self) -> &RoomPhase {
        &self.phase
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn player(&self, seat: usize) -> Option<&Player> {
        self.seats.get(seat).and_then(Option::as_ref)
    }

    pub(crate) fn player_mut(&mut self, seat: usize) -> Option<&mut Player> {
        self.seats.get_mut(seat).and_then(Option::as_mut)
    }

    pub fn name(&self, seat: usize) -> &str {
        self.player(seat).map_or("Unknown", |player| player.name.as_str())
    }

    pub fn seated(&self) -> impl Iterator<Item = (usize, &Player)> + '_ {
        self.seats
            .iter()
            .enumerate()
            .filter_map(|(seat, player)| player.as_ref().map(|player| (seat, player)))
    }

    pub fn is_alive(&self, seat: usize) -> bool {
        self.player(seat).is_some_and(|player| player.alive)
    }

    /// Living seats other than `exclude`, in seat order.
    pub fn other_living_seats(&self, exclude: usize) -> Vec<usize> {
        self.seated()
            .filter(|(seat, player)| *seat != exclude && player.alive)
            .map(|(seat, _)| seat)
            .collect()
    }

    /// The only living seat, once everyone else is out.
    pub fn sole_survivor(&self) -> Option<usize> {
        let mut living = self.seated().filter(|(_, player)| player.alive);
        match (living.next(), living.next()) {
            (Some((seat, _)), None) => Some(seat),
            _ => None,
        }
    }

    /// Closes any open request and hands the turn to the next living seat
    /// after the current one, wrapping around.
    pub fn advance_turn(&mut self) {
        self.phase = RoomPhase::Idle;

        let next = (1..=SEAT_COUNT)
            .map(|n| (self.turn + n) % SEAT_COUNT)
            .find(|&seat| self.is_alive(seat));
        if let Some(next) = next {
            self.turn = next;
        }
    }

    /// Swaps a live card for a fresh one from the deck. The new card goes to
    /// the end of the hand.
    pub(crate) fn replace_card<R: Rng + Sized>(&mut self, seat: usize, card_idx: usize, rng: &mut R) -> Result<(), TreasonError> {
        let Some(player) = self.seats.get_mut(seat).and_then(Option::as_mut) else {
            return Err(Rejection::EmptySeat(seat).into());
        };
        if !player.hand.get(card_idx).is_some_and(|card| card.alive) {
            return Err(Rejection::CardNotAlive(card_idx).into());
        }

        let card = player.hand.remove(card_idx);
        self.deck.return_and_reshuffle([card.role], rng);
        player.hand.push(Card::new(self.deck.draw()?));
        Ok(())
    }

    /// Role tokens accounted for across the deck, every hand and any
    /// exchange in progress.
    pub fn token_count(&self) -> usize {
        let in_hands: usize = self.seated().map(|(_, player)| player.hand.len()).sum();
        let in_exchange = self.phase.exchange().map_or(0, |request| request.drawn());
        self.deck.len() + in_hands + in_exchange
    }

    pub fn check_tokens(&self) -> Result<(), TreasonError> {
        match self.token_count() {
            TOKEN_COUNT => Ok(()),
            count => Err(TreasonError::TokenCount(count)),
        }
    }

    // gives seat N exactly hands[N]; seats without an entry get whatever is left
    #[cfg(test)]
    pub(crate) fn rig(&mut self, hands: &[&[Role]]) {
        use rand::SeedableRng;

        let mut rng = rand_pcg::Pcg64::seed_from_u64(0);
        for player in self.seats.iter_mut().flatten() {
            let returned: Vec<Role> = player.hand.drain(..).map(|card| card.role).collect();
            self.deck.return_and_reshuffle(returned, &mut rng);
        }

        for (seat, slot) in self.seats.iter_mut().enumerate() {
            let (Some(player), Some(roles)) = (slot.as_mut(), hands.get(seat)) else {
                continue;
            };
            for &role in roles.iter() {
                let role = self.deck.take(role).expect("more than three copies rigged");
                player.hand.push(Card::new(role));
            }
        }

        for (seat, slot) in self.seats.iter_mut().enumerate() {
            let Some(player) = slot.as_mut().filter(|_| hands.get(seat).is_none()) else {
                continue;
            };
            for _ in 0..HAND_SIZE {
                player.hand.push(Card::new(self.deck.draw().expect("deck ran out while rigging")));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_pcg::Pcg64;
    use crate::error::{Rejection, TreasonError};
    use crate::table::Table;
    use crate::Role::{Assassin, Duke};
    use crate::TOKEN_COUNT;

    fn seated(seats: &[usize]) -> Table {
        let mut table = Table::new();
        for &seat in seats {
            table.seat(seat, format!("p{seat}")).unwrap();
        }
        table.deal(&mut Pcg64::seed_from_u64(3)).unwrap();
        table
    }

    #[test]
    fn deal_needs_two_players() {
        let mut table = Table::new();
        table.seat(2, "solo").unwrap();
        let result = table.deal(&mut Pcg64::seed_from_u64(1));
        assert!(matches!(result, Err(TreasonError::Rejected(Rejection::NotEnoughPlayers))));
        assert!(!table.started());
    }

    #[test]
    fn deal_gives_everyone_two_cards_and_two_coins() {
        let table = seated(&[1, 3, 4]);

        assert_eq!(table.turn(), 1);
        for (_, player) in table.seated() {
            assert_eq!(player.hand.len(), 2);
            assert_eq!(player.coins, 2);
            assert!(player.alive);
        }
        assert_eq!(table.deck().len(), TOKEN_COUNT - 6);
        assert_eq!(table.token_count(), TOKEN_COUNT);
    }

    #[test]
    fn seats_lock_once_started() {
        let mut table = seated(&[0, 1]);
        assert_eq!(table.seat(2, "late"), Err(Rejection::AlreadyStarted));
        assert_eq!(table.unseat(0).map(|_| ()), Err(Rejection::AlreadyStarted));
        assert_eq!(Table::new().seat(6, "nowhere"), Err(Rejection::NoSuchSeat(6)));
    }

    #[test]
    fn advance_turn_skips_empty_and_dead_seats() {
        let mut table = seated(&[0, 2, 3, 5]);

        table.advance_turn();
        assert_eq!(table.turn(), 2);

        table.player_mut(3).unwrap().alive = false;
        table.advance_turn();
        assert_eq!(table.turn(), 5);

        // wraps around
        table.advance_turn();
        assert_eq!(table.turn(), 0);
    }

    #[test]
    fn other_living_seats() {
        let mut table = seated(&[0, 1, 2, 3]);
        assert_eq!(table.other_living_seats(0), vec![1, 2, 3]);
        assert_eq!(table.other_living_seats(2), vec![0, 1, 3]);

        table.player_mut(1).unwrap().alive = false;
        assert_eq!(table.other_living_seats(2), vec![0, 3]);
        assert_eq!(table.sole_survivor(), None);

        table.player_mut(0).unwrap().alive = false;
        table.player_mut(3).unwrap().alive = false;
        assert_eq!(table.sole_survivor(), Some(2));
    }

    #[test]
    fn replacing_a_card_conserves_tokens() {
        let mut table = seated(&[0, 1]);
        table.rig(&[&[Duke, Assassin]]);

        table.replace_card(0, 0, &mut Pcg64::seed_from_u64(9)).unwrap();

        let hand = &table.player(0).unwrap().hand;
        assert_eq!(hand.len(), 2);
        assert_eq!(hand[0].role, Assassin);
        assert_eq!(table.token_count(), TOKEN_COUNT);
    }
}
