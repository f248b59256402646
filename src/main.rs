use std::error::Error;
use std::sync::Arc;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use treason::config::SimConfig;
use treason::{Intent, Message, Rooms, TreasonError};

#[derive(Debug, Serialize)]
struct GameRecord {
    room: String,
    game: usize,
    winner_seat: Option<usize>,
    intents: usize,
}

// plays one game to the end with uniformly random legal intents
async fn play_game(rooms: &Rooms, id: &str, players: usize, max_intents: usize, rng: &mut Pcg64) -> Result<(Option<usize>, usize), TreasonError> {
    rooms.start(id).await?;

    for played in 0..max_intents {
        let mut choices: Vec<(usize, Intent)> = Vec::new();
        for seat in 0..players {
            let intents = rooms.legal_intents(id, seat).await?;
            choices.extend(intents.into_iter().map(|intent| (seat, intent)));
        }
        if choices.is_empty() {
            warn!(room = id, played, "no legal intents left");
            return Ok((None, played));
        }

        let (seat, intent) = choices.swap_remove(rng.gen_range(0..choices.len()));
        let messages = rooms.submit(id, seat, intent).await?;
        let winner = messages.iter().find_map(|outbound| match outbound.message {
            Message::GameOver { winner_seat, .. } => Some(winner_seat),
            Message::GameUpdate(_) => None,
        });
        if winner.is_some() {
            return Ok((winner, played + 1));
        }
    }

    warn!(room = id, max_intents, "game abandoned");
    Ok((None, max_intents))
}

async fn run_room(rooms: Arc<Rooms>, config: SimConfig, room: usize) -> Result<Vec<GameRecord>, TreasonError> {
    let id = format!("room-{room}");
    let seed = config.seed.wrapping_add(room as u64);
    rooms.open_seeded(id.as_str(), seed).await;
    for seat in 0..config.players {
        rooms.sit(&id, seat, format!("bot{seat}")).await?;
    }

    let mut rng = Pcg64::seed_from_u64(seed);
    let mut records = Vec::with_capacity(config.games);
    for game in 0..config.games {
        let (winner_seat, intents) = play_game(&rooms, &id, config.players, config.max_intents, &mut rng).await?;
        info!(room = %id, game, ?winner_seat, intents, "game finished");
        records.push(GameRecord { room: id.clone(), game, winner_seat, intents });
        if winner_seat.is_none() {
            // an abandoned game is still running, so the room can't deal again
            break;
        }
    }

    rooms.close(&id).await?;
    Ok(records)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = SimConfig::from_env();
    info!(?config, "starting simulation");

    let rooms = Arc::new(Rooms::new());
    let tasks: Vec<_> = (0..config.rooms)
        .map(|room| tokio::spawn(run_room(rooms.clone(), config.clone(), room)))
        .collect();

    let mut records = Vec::new();
    for task in tasks {
        records.extend(task.await??);
    }

    let mut wins = vec![0usize; config.players];
    for record in &records {
        if let Some(count) = record.winner_seat.and_then(|seat| wins.get_mut(seat)) {
            *count += 1;
        }
    }
    info!(games = records.len(), ?wins, "simulation done");

    if let Some(path) = &config.csv {
        let mut writer = csv::Writer::from_path(path)?;
        for record in &records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        info!(path = %path.display(), "wrote results");
    }

    Ok(())
}
