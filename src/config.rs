use leptos::logging::warn;
use regex::Regex;
use std::sync::OnceLock;

pub const DEFAULT_STORAGE_KEY: &str = "sticky-notes";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardConfig {
    pub storage_key: String,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl BoardConfig {
    /// Reads `?board=<name>` from a `location.search` string. Each named board
    /// lives under its own storage key; invalid names fall back to the default.
    pub fn from_query(search: &str) -> Self {
        let board = search
            .trim_start_matches('?')
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "board")
            .map(|(_, value)| value);

        match board {
            None => Self::default(),
            Some(name) if is_board_name(name) => Self {
                storage_key: format!("{DEFAULT_STORAGE_KEY}:{name}"),
            },
            Some(name) => {
                warn!("ignoring invalid board name {name:?}, using {DEFAULT_STORAGE_KEY}");
                Self::default()
            }
        }
    }
}

fn is_board_name(name: &str) -> bool {
    static RE_BOARD: OnceLock<Regex> = OnceLock::new();
    let re_board = RE_BOARD.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").unwrap());
    re_board.is_match(name)
}
