use serde::{Deserialize, Serialize};

/// Persisted state of a single game, keyed by its numeric identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Unique identifier allocated at creation time.
    pub id: u64,
    /// Move list in Portable Game Notation, opaque to the server.
    pub pgn: String,
    /// Token naming the side (or player) expected to move next.
    pub current_turn: String,
    /// Kept for document compatibility; stored games are always live.
    pub is_game_live: bool,
}

impl GameEntity {
    /// Fresh game record with an empty move list.
    pub fn new_live(id: u64) -> Self {
        Self {
            id,
            pgn: String::new(),
            current_turn: String::new(),
            is_game_live: true,
        }
    }
}
