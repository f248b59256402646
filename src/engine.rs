use rand::SeedableRng;
use rand_pcg::Pcg64;
use tracing::{debug, info};
use crate::action::{ActionKind, Choice, Intent, ACTION_VARIANTS};
use crate::error::{Rejection, TreasonError};
use crate::phase::{Block, Continuation, DiscardRequest, ExchangeRequest, PendingAction, RoomPhase, Stage};
use crate::projector::{self, Outbound, Sfx};
use crate::table::Table;
use crate::Role;

// cards an exchange draws on top of the actor's live ones
const EXCHANGE_DRAW: usize = 2;

/// One game room: the table, its randomness, and the messages the intent
/// being applied has produced so far.
#[derive(Clone, Debug)]
pub struct Room {
    table: Table,
    rng: Pcg64,
    outbox: Vec<Outbound>,
}

impl Default for Room {
    fn default() -> Self {
        Self::new()
    }
}

// what a response will do, worked out before anything is mutated
enum Step {
    Allow,
    Challenge { accused: usize, claim: Role, is_block: bool },
    Block(Role),
}

impl Room {
    pub fn new() -> Self {
        Self::with_rng(Pcg64::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(Pcg64::seed_from_u64(seed))
    }

    fn with_rng(rng: Pcg64) -> Self {
        Room {
            table: Table::new(),
            rng,
            outbox: Vec::new(),
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn sit(&mut self, seat: usize, name: impl Into<String>) -> Result<(), Rejection> {
        self.table.seat(seat, name)
    }

    pub fn leave(&mut self, seat: usize) -> Result<(), Rejection> {
        self.table.unseat(seat).map(|_| ())
    }

    pub fn start(&mut self) -> Result<Vec<Outbound>, TreasonError> {
        self.table.deal(&mut self.rng)?;
        info!(players = self.table.seated().count(), first = self.table.turn(), "game started");
        self.broadcast("Game Started!", None);
        Ok(std::mem::take(&mut self.outbox))
    }

    /// Applies one intent from `seat`. On success returns every message the
    /// intent produced, in order. A rejected intent leaves the room untouched.
    pub fn apply(&mut self, seat: usize, intent: Intent) -> Result<Vec<Outbound>, TreasonError> {
        self.outbox.clear();
        debug!(seat, ?intent, phase = self.table.phase().label(), "applying intent");

        match self.dispatch(seat, intent) {
            Ok(()) => {
                if self.table.started() {
                    self.table.check_tokens()?;
                }
                Ok(std::mem::take(&mut self.outbox))
            }
            Err(err) => {
                self.outbox.clear();
                Err(err)
            }
        }
    }

    fn dispatch(&mut self, seat: usize, intent: Intent) -> Result<(), TreasonError> {
        if !self.table.started() {
            return Err(Rejection::NotStarted.into());
        }
        if self.table.player(seat).is_none() {
            return Err(Rejection::EmptySeat(seat).into());
        }
        if !self.table.is_alive(seat) {
            return Err(Rejection::Eliminated(seat).into());
        }

        match intent {
            Intent::DeclareAction { kind, target } => self.declare(seat, kind, target),
            Intent::Respond { choice, role } => self.respond(seat, choice, role),
            Intent::Discard { index } => self.discard(seat, index),
            Intent::FinishExchange { kept } => self.finish_exchange(seat, kept),
        }
    }

    fn declare(&mut self, actor: usize, kind: ActionKind, target: Option<usize>) -> Result<(), TreasonError> {
        if actor != self.table.turn() {
            return Err(Rejection::NotYourTurn(actor).into());
        }
        if !self.table.phase().is_idle() {
            return Err(Rejection::RequestPending.into());
        }

        let target = if kind.is_targeted() {
            match target {
                Some(target) if target != actor && self.table.is_alive(target) => Some(target),
                _ => return Err(Rejection::BadTarget(kind, target).into()),
            }
        } else {
            None
        };

        let coins = self.coins(actor);
        if coins < kind.cost() {
            return Err(Rejection::InsufficientCoins(kind, kind.cost()).into());
        }

        let name = self.table.name(actor).to_owned();
        match (kind, target) {
            (ActionKind::Income, _) => {
                self.add_coins(actor, 1);
                self.broadcast(format!("{name} took Income."), Some(Sfx::Coins));
                self.next_turn();
                Ok(())
            }
            (ActionKind::Coup, Some(target)) => {
                self.spend_coins(actor, kind.cost());
                let target_name = self.table.name(target).to_owned();
                self.broadcast(format!("{name} Coup -> {target_name}!"), Some(Sfx::Drama));
                self.trigger_loss(target, format!("Coup by {name}!"), Sfx::Drama, Continuation::NextTurn)
            }
            _ => {
                let pending = PendingAction::new(kind, actor, target);
                let message = match (kind, target) {
                    (ActionKind::ForeignAid, _) => format!("{name} wants Foreign Aid. Block?"),
                    (_, Some(target)) => format!("{name} uses {kind} -> {}", self.table.name(target)),
                    (_, None) => format!("{name} uses {kind}"),
                };
                debug!(actor, %kind, ?target, stage = ?pending.stage, "action declared");
                self.table.phase = RoomPhase::AwaitingResponse(pending);
                self.broadcast(message, None);
                Ok(())
            }
        }
    }

    fn plan_response(&self, responder: usize, choice: Choice, claim: Option<Role>) -> Result<Step, Rejection> {
        let Some(pending) = self.table.phase().negotiating() else {
            return Err(Rejection::WrongPhase);
        };
        if !self.table.is_alive(responder) {
            return Err(Rejection::Eliminated(responder));
        }
        // nobody answers their own claim
        if responder == pending.subject() {
            return Err(Rejection::CannotRespond(responder));
        }

        match (pending.stage, choice) {
            (_, Choice::Allow) => {
                if pending.responded.contains(responder) {
                    return Err(Rejection::AlreadyResponded(responder));
                }
                Ok(Step::Allow)
            }
            (Stage::ChallengeAction, Choice::Challenge) => {
                let claim = pending.kind.claimed_role().ok_or(Rejection::IllegalResponse)?;
                Ok(Step::Challenge { accused: pending.actor, claim, is_block: false })
            }
            (Stage::ChallengeBlock, Choice::Challenge) => {
                let block = pending.block.ok_or(Rejection::IllegalResponse)?;
                Ok(Step::Challenge { accused: block.seat, claim: block.claim, is_block: true })
            }
            (Stage::BlockAction, Choice::Block) => {
                if pending.kind.is_targeted() && pending.target != Some(responder) {
                    return Err(Rejection::CannotBlock(responder));
                }
                let blockers = pending.kind.blockers();
                let role = claim.or_else(|| blockers.first().copied()).ok_or(Rejection::IllegalResponse)?;
                if !blockers.contains(&role) {
                    return Err(Rejection::WrongBlocker(role, pending.kind));
                }
                Ok(Step::Block(role))
            }
            _ => Err(Rejection::IllegalResponse),
        }
    }

    fn respond(&mut self, responder: usize, choice: Choice, claim: Option<Role>) -> Result<(), TreasonError> {
        let step = self.plan_response(responder, choice, claim)?;
        let mut pending = match std::mem::take(&mut self.table.phase) {
            RoomPhase::AwaitingResponse(pending) => pending,
            other => {
                self.table.phase = other;
                return Err(Rejection::WrongPhase.into());
            }
        };

        match step {
            Step::Allow => {
                pending.responded.insert(responder);
                if !self.quorum_reached(&pending, responder) {
                    self.table.phase = RoomPhase::AwaitingResponse(pending);
                    self.refresh();
                    return Ok(());
                }

                match pending.stage {
                    Stage::ChallengeAction if !pending.kind.blockers().is_empty() => {
                        pending.enter(Stage::BlockAction);
                        self.table.phase = RoomPhase::AwaitingResponse(pending);
                        self.broadcast("Action claim allowed. Waiting for target to block...", None);
                        Ok(())
                    }
                    Stage::ChallengeAction | Stage::BlockAction => self.execute(pending),
                    Stage::ChallengeBlock => {
                        debug!(actor = pending.actor, kind = %pending.kind, "block stands");
                        self.broadcast("Block accepted. Action fails.", None);
                        self.next_turn();
                        Ok(())
                    }
                }
            }
            Step::Challenge { accused, claim, is_block } => {
                self.resolve_challenge(responder, accused, claim, is_block, pending)
            }
            Step::Block(role) => {
                pending.block = Some(Block { seat: responder, claim: role });
                pending.enter(Stage::ChallengeBlock);
                let message = format!("{} blocks with {:?}. Challenge?", self.table.name(responder), role);
                self.table.phase = RoomPhase::AwaitingResponse(pending);
                self.broadcast(message, None);
                Ok(())
            }
        }
    }

    fn quorum_reached(&self, pending: &PendingAction, responder: usize) -> bool {
        match pending.stage {
            // only the target's word settles a targeted block window
            Stage::BlockAction if pending.kind.is_targeted() => pending.target == Some(responder),
            _ => pending.responded.covers(&self.table.other_living_seats(pending.subject())),
        }
    }

    fn resolve_challenge(&mut self, challenger: usize, accused: usize, claim: Role, is_block: bool, pending: PendingAction) -> Result<(), TreasonError> {
        let accused_name = self.table.name(accused).to_owned();
        let card_idx = self.table.player(accused).and_then(|player| player.find_live(claim));
        debug!(challenger, accused, ?claim, is_block, truthful = card_idx.is_some(), "challenge");

        match card_idx {
            Some(card_idx) => {
                self.broadcast(format!("Challenge FAILED! {accused_name} has {claim:?}."), Some(Sfx::Drama));
                self.table.replace_card(accused, card_idx, &mut self.rng)?;
                // a block that holds defeats the action; an action claim that holds lets it proceed
                let continuation = if is_block {
                    Continuation::Abort
                } else {
                    Continuation::Execute(pending)
                };
                self.trigger_loss(challenger, "Challenge failed.".to_owned(), Sfx::Drama, continuation)
            }
            None => {
                self.broadcast(format!("Challenge SUCCESS! {accused_name} caught bluffing."), Some(Sfx::Drama));
                let continuation = if is_block {
                    Continuation::Execute(pending)
                } else {
                    Continuation::NextTurn
                };
                self.trigger_loss(accused, "Bluff called.".to_owned(), Sfx::Drama, continuation)
            }
        }
    }

    fn trigger_loss(&mut self, victim: usize, reason: String, sfx: Sfx, continuation: Continuation) -> Result<(), TreasonError> {
        self.broadcast(reason.as_str(), Some(sfx));

        let name = self.table.name(victim).to_owned();
        let live: Vec<usize> = self.table.player(victim).map(|player| player.live_cards().collect()).unwrap_or_default();
        match live.as_slice() {
            [] => self.finish_loss(victim, continuation),
            [only] => {
                let role = self.table.player_mut(victim).and_then(|player| player.kill(*only));
                if let Some(role) = role {
                    self.broadcast(format!("{name} lost last influence: {role:?}"), Some(Sfx::Stab));
                }
                self.finish_loss(victim, continuation)
            }
            _ => {
                self.table.phase = RoomPhase::AwaitingDiscard(DiscardRequest { victim, reason, continuation });
                self.broadcast(format!("Waiting for {name} to discard..."), Some(sfx));
                Ok(())
            }
        }
    }

    fn discard(&mut self, victim: usize, card_idx: usize) -> Result<(), TreasonError> {
        let Some(request) = self.table.phase().discard() else {
            return Err(Rejection::WrongPhase.into());
        };
        if request.victim != victim {
            return Err(Rejection::WrongPhase.into());
        }
        let alive = self.table.player(victim)
            .and_then(|player| player.hand.get(card_idx))
            .is_some_and(|card| card.alive);
        if !alive {
            return Err(Rejection::CardNotAlive(card_idx).into());
        }

        let request = match std::mem::take(&mut self.table.phase) {
            RoomPhase::AwaitingDiscard(request) => request,
            other => {
                self.table.phase = other;
                return Err(Rejection::WrongPhase.into());
            }
        };
        let role = self.table.player_mut(victim).and_then(|player| player.kill(card_idx));
        if let Some(role) = role {
            let name = self.table.name(victim).to_owned();
            self.broadcast(format!("{name} discarded {role:?}."), Some(Sfx::Stab));
        }
        self.finish_loss(victim, request.continuation)
    }

    fn finish_loss(&mut self, victim: usize, continuation: Continuation) -> Result<(), TreasonError> {
        let eliminated = self.table.player_mut(victim).is_some_and(|player| {
            let out = player.alive && player.live_count() == 0;
            if out {
                player.alive = false;
            }
            out
        });

        if eliminated {
            info!(seat = victim, "seat eliminated");
            if let Some(winner) = self.table.sole_survivor() {
                info!(seat = winner, winner = self.table.name(winner), "game over");
                let messages = projector::game_over(&self.table, winner);
                self.outbox.extend(messages);
                self.table.reset();
                return Ok(());
            }
        }

        match continuation {
            Continuation::NextTurn | Continuation::Abort => {
                self.next_turn();
                Ok(())
            }
            Continuation::Execute(pending) => self.execute(pending),
        }
    }

    fn execute(&mut self, pending: PendingAction) -> Result<(), TreasonError> {
        let actor = pending.actor;
        let name = self.table.name(actor).to_owned();
        debug!(actor, kind = %pending.kind, target = ?pending.target, "executing");

        let message = match (pending.kind, pending.target) {
            (ActionKind::Exchange, _) => return self.initiate_exchange(actor),
            (ActionKind::Assassinate, Some(target)) => {
                self.spend_coins(actor, pending.kind.cost());
                let reason = format!("{name} assassinates {}!", self.table.name(target));
                return self.trigger_loss(target, reason, Sfx::Heartbeat, Continuation::NextTurn);
            }
            (ActionKind::Steal, Some(target)) => {
                let amount = self.coins(target).min(2);
                self.spend_coins(target, amount);
                self.add_coins(actor, amount);
                format!("{name} performs {}! Stole {amount} from {}.", pending.kind, self.table.name(target))
            }
            (ActionKind::ForeignAid, _) => {
                self.add_coins(actor, 2);
                format!("{name} performs {}!", pending.kind)
            }
            (ActionKind::Tax, _) => {
                self.add_coins(actor, 3);
                format!("{name} performs {}!", pending.kind)
            }
            // immediate actions never wait on a response
            (kind, target) => return Err(Rejection::BadTarget(kind, target).into()),
        };

        self.broadcast(message, Some(Sfx::Coins));
        self.next_turn();
        Ok(())
    }

    fn initiate_exchange(&mut self, actor: usize) -> Result<(), TreasonError> {
        let mut pool = self.table.player(actor).map(|player| player.live_roles()).unwrap_or_default();
        let keep = pool.len();
        for _ in 0..EXCHANGE_DRAW {
            if self.table.deck().is_empty() {
                break;
            }
            pool.push(self.table.deck.draw()?);
        }

        let name = self.table.name(actor).to_owned();
        self.table.phase = RoomPhase::AwaitingExchange(ExchangeRequest { actor, pool, keep });
        self.broadcast(format!("{name} is exchanging cards..."), None);
        Ok(())
    }

    fn finish_exchange(&mut self, actor: usize, kept: Vec<Role>) -> Result<(), TreasonError> {
        let Some(request) = self.table.phase().exchange() else {
            return Err(Rejection::WrongPhase.into());
        };
        if request.actor != actor {
            return Err(Rejection::WrongPhase.into());
        }
        if kept.len() != request.keep {
            return Err(Rejection::ExchangeMismatch.into());
        }

        // every kept role has to come out of the pool one for one
        let mut remaining = request.pool.clone();
        for role in &kept {
            let Some(idx) = remaining.iter().position(|r| r == role) else {
                return Err(Rejection::ExchangeMismatch.into());
            };
            remaining.swap_remove(idx);
        }

        self.table.phase = RoomPhase::Idle;
        self.table.deck.return_and_reshuffle(remaining, &mut self.rng);
        if let Some(player) = self.table.player_mut(actor) {
            let live = player.hand.iter_mut().filter(|card| card.alive);
            for (card, role) in live.zip(kept) {
                card.role = role;
            }
        }

        self.broadcast("Exchange complete.", Some(Sfx::Coins));
        self.next_turn();
        Ok(())
    }

    fn next_turn(&mut self) {
        self.table.advance_turn();
        debug!(turn = self.table.turn(), "next turn");
        self.broadcast("Next Turn", None);
    }

    fn broadcast(&mut self, log_line: impl AsRef<str>, sfx: Option<Sfx>) {
        let messages = projector::broadcast(&self.table, Some(log_line.as_ref()), sfx);
        self.outbox.extend(messages);
    }

    // quorum progress: no log line, just fresh per-viewer flags
    fn refresh(&mut self) {
        let messages = projector::broadcast(&self.table, None, None);
        self.outbox.extend(messages);
    }

    fn coins(&self, seat: usize) -> u32 {
        self.table.player(seat).map_or(0, |player| player.coins)
    }

    fn add_coins(&mut self, seat: usize, amount: u32) {
        if let Some(player) = self.table.player_mut(seat) {
            player.coins = player.coins.saturating_add(amount);
        }
    }

    fn spend_coins(&mut self, seat: usize, amount: u32) {
        if let Some(player) = self.table.player_mut(seat) {
            player.coins = player.coins.saturating_sub(amount);
        }
    }

    /// Every intent `seat` could send right now that would be accepted.
    pub fn legal_intents(&self, seat: usize) -> Vec<Intent> {
        let mut intents = Vec::new();
        if !self.table.started() || !self.table.is_alive(seat) {
            return intents;
        }

        match self.table.phase() {
            RoomPhase::Idle => {
                if seat != self.table.turn() {
                    return intents;
                }
                let coins = self.coins(seat);
                let opponents = self.table.other_living_seats(seat);
                for kind in ACTION_VARIANTS {
                    if coins < kind.cost() {
                        continue;
                    }
                    if kind.is_targeted() {
                        intents.extend(opponents.iter().map(|&target| Intent::declare_against(kind, target)));
                    } else {
                        intents.push(Intent::declare(kind));
                    }
                }
            }
            RoomPhase::AwaitingResponse(pending) => {
                let candidates = [(Choice::Allow, None), (Choice::Challenge, None)]
                    .into_iter()
                    .chain(pending.kind.blockers().iter().map(|&role| (Choice::Block, Some(role))));
                for (choice, role) in candidates {
                    if self.plan_response(seat, choice, role).is_ok() {
                        intents.push(Intent::Respond { choice, role });
                    }
                }
            }
            RoomPhase::AwaitingDiscard(request) => {
                if request.victim == seat {
                    if let Some(player) = self.table.player(seat) {
                        intents.extend(player.live_cards().map(|index| Intent::Discard { index }));
                    }
                }
            }
            RoomPhase::AwaitingExchange(request) => {
                if request.actor == seat {
                    for kept in keep_choices(&request.pool, request.keep) {
                        let intent = Intent::FinishExchange { kept };
                        if !intents.contains(&intent) {
                            intents.push(intent);
                        }
                    }
                }
            }
        }

        intents
    }
}

// every way of picking `keep` roles out of the pool, in pool order
fn keep_choices(pool: &[Role], keep: usize) -> Vec<Vec<Role>> {
    if keep == 0 {
        return vec![Vec::new()];
    }
    if pool.len() < keep {
        return Vec::new();
    }

    let mut choices = Vec::new();
    for (idx, &role) in pool.iter().enumerate() {
        for mut rest in keep_choices(&pool[idx + 1..], keep - 1) {
            rest.insert(0, role);
            choices.push(rest);
        }
    }
    choices
}
