use std::path::PathBuf;
use crate::table::SEAT_COUNT;

/// Knobs for the random-play simulator, read from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimConfig {
    pub rooms: usize,
    pub players: usize,
    pub games: usize,
    pub seed: u64,
    pub max_intents: usize,
    pub csv: Option<PathBuf>,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            rooms: 8,
            players: 4,
            games: 10,
            seed: 42,
            max_intents: 2_000,
            csv: None,
        }
    }
}

impl SimConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let fallback = SimConfig::default();
        SimConfig {
            rooms: read(&lookup, "TREASON_ROOMS", fallback.rooms),
            players: read(&lookup, "TREASON_PLAYERS", fallback.players).clamp(2, SEAT_COUNT),
            games: read(&lookup, "TREASON_GAMES", fallback.games),
            seed: read(&lookup, "TREASON_SEED", fallback.seed),
            max_intents: read(&lookup, "TREASON_MAX_INTENTS", fallback.max_intents),
            csv: lookup("TREASON_CSV").filter(|raw| !raw.is_empty()).map(PathBuf::from),
        }
    }
}

fn read<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, fallback: T) -> T {
    lookup(key)
        .and_then(|raw| raw.trim().parse::<T>().ok())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use crate::config::SimConfig;

    fn config(vars: &[(&str, &str)]) -> SimConfig {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        SimConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn falls_back_on_missing_or_garbled_values() {
        assert_eq!(config(&[]), SimConfig::default());
        assert_eq!(config(&[("TREASON_ROOMS", "lots")]).rooms, 8);
        assert_eq!(config(&[("TREASON_SEED", " 7 ")]).seed, 7);
    }

    #[test]
    fn players_are_clamped_to_the_table() {
        assert_eq!(config(&[("TREASON_PLAYERS", "1")]).players, 2);
        assert_eq!(config(&[("TREASON_PLAYERS", "9")]).players, 6);
        assert_eq!(config(&[("TREASON_PLAYERS", "5")]).players, 5);
    }

    #[test]
    fn csv_path_is_optional() {
        assert_eq!(config(&[("TREASON_CSV", "")]).csv, None);
        assert_eq!(config(&[("TREASON_CSV", "out.csv")]).csv, Some(PathBuf::from("out.csv")));
    }
}
