//! Per-viewer projection of a room.
//!
//! Every broadcast produces one [`Outbound`] per seated player. The public
//! part of each view is identical for everyone; only the viewer's own hand and
//! the "you need to act" flags differ. Live cards of other players are never
//! serialized with their role.

use std::collections::BTreeMap;
use serde::{Serialize, Serializer};
use crate::phase::Stage;
use crate::player::Card;
use crate::table::Table;
use crate::{ActionKind, Role};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sfx {
    Coins,
    Drama,
    Heartbeat,
    Stab,
}

/// A card as seen by someone who does not hold it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Face {
    Hidden,
    Shown(Role),
}

impl Serialize for Face {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Face::Hidden => serializer.serialize_str("hidden"),
            Face::Shown(role) => role.serialize(serializer),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CardView {
    pub role: Face,
    pub alive: bool,
}

impl From<&Card> for CardView {
    fn from(card: &Card) -> Self {
        CardView {
            role: if card.alive { Face::Hidden } else { Face::Shown(card.role) },
            alive: card.alive,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SeatView {
    pub name: String,
    pub coins: u32,
    pub hand: Vec<CardView>,
    pub alive: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExchangeView {
    pub pool: Vec<Role>,
    pub keep_count: usize,
}

/// Arrow drawn from the actor to the target of a targeted action.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Arrow {
    pub from: usize,
    pub to: usize,
    pub label: ActionKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct View {
    pub viewer_seat: usize,
    pub turn_seat: usize,
    pub table: BTreeMap<usize, SeatView>,
    pub viewer_hand: Vec<Card>,
    pub interaction_needed: bool,
    pub interaction_phase: Option<Stage>,
    pub pending_action_kind: Option<ActionKind>,
    pub discard_needed: bool,
    pub exchange_needed: bool,
    pub exchange_pool: Option<ExchangeView>,
    pub log_line: Option<String>,
    pub sound_cue: Option<Sfx>,
    pub directional_indicator: Option<Arrow>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Message {
    GameUpdate(View),
    GameOver { winner: String, winner_seat: usize },
}

/// One message addressed to the connection sitting in `seat`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Outbound {
    pub seat: usize,
    pub message: Message,
}

/// Whether `viewer` still owes a response to the action under negotiation.
pub fn interaction_needed(table: &Table, viewer: usize) -> bool {
    let Some(pending) = table.phase().negotiating() else {
        return false;
    };
    if !table.is_alive(viewer) || pending.responded.contains(viewer) {
        return false;
    }

    if viewer == pending.actor {
        // the actor only gets a say once someone blocks them
        return pending.stage == Stage::ChallengeBlock;
    }

    match pending.stage {
        Stage::ChallengeAction => true,
        Stage::BlockAction => !pending.kind.is_targeted() || pending.target == Some(viewer),
        Stage::ChallengeBlock => pending.block.map_or(true, |block| block.seat != viewer),
    }
}

pub fn project(table: &Table, viewer: usize, log_line: Option<&str>, sound_cue: Option<Sfx>) -> Option<View> {
    let me = table.player(viewer)?;

    let seats = table
        .seated()
        .map(|(seat, player)| {
            let view = SeatView {
                name: player.name.clone(),
                coins: player.coins,
                hand: player.hand.iter().map(CardView::from).collect(),
                alive: player.alive,
            };
            (seat, view)
        })
        .collect();

    let phase = table.phase();
    let pending = phase.pending();
    let discard_needed = phase.discard().is_some_and(|request| request.victim == viewer);
    let exchange = phase.exchange().filter(|request| request.actor == viewer);

    Some(View {
        viewer_seat: viewer,
        turn_seat: table.turn(),
        table: seats,
        viewer_hand: me.hand.clone(),
        interaction_needed: interaction_needed(table, viewer),
        interaction_phase: phase.negotiating().map(|pending| pending.stage),
        pending_action_kind: pending.map(|pending| pending.kind),
        discard_needed,
        exchange_needed: exchange.is_some(),
        exchange_pool: exchange.map(|request| ExchangeView {
            pool: request.pool.clone(),
            keep_count: request.keep,
        }),
        log_line: log_line.map(str::to_owned),
        sound_cue,
        directional_indicator: pending.and_then(|pending| {
            pending.target.map(|to| Arrow {
                from: pending.actor,
                to,
                label: pending.kind,
            })
        }),
    })
}

/// One game update per seated player.
pub fn broadcast(table: &Table, log_line: Option<&str>, sound_cue: Option<Sfx>) -> Vec<Outbound> {
    table
        .seated()
        .filter_map(|(seat, _)| project(table, seat, log_line, sound_cue))
        .map(|view| Outbound {
            seat: view.viewer_seat,
            message: Message::GameUpdate(view),
        })
        .collect()
}

pub fn game_over(table: &Table, winner_seat: usize) -> Vec<Outbound> {
    let winner = table.name(winner_seat).to_owned();
    table
        .seated()
        .map(|(seat, _)| Outbound {
            seat,
            message: Message::GameOver { winner: winner.clone(), winner_seat },
        })
        .collect()
}
