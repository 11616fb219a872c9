use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::models::GameEntity,
    dto::validation::{MAX_PLAYER_LENGTH, MAX_TURN_LENGTH, validate_token},
    error::ServiceError,
};

/// Largest accepted PGN payload in bytes.
pub const MAX_PGN_BYTES: usize = 64 * 1024;

/// Wire representation of a live game.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    /// Identifier allocated by `/new`.
    pub id: u64,
    /// Move list in PGN.
    pub pgn: String,
    /// Side expected to move next.
    pub current_turn: String,
    /// Always true for a stored game.
    pub is_game_live: bool,
}

impl From<GameEntity> for GameRecord {
    fn from(value: GameEntity) -> Self {
        Self {
            id: value.id,
            pgn: value.pgn,
            current_turn: value.current_turn,
            is_game_live: value.is_game_live,
        }
    }
}

/// Body of `POST /live/{id}`: the full game record after a player's move.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    /// Must match the path id when present.
    #[serde(default)]
    pub id: Option<u64>,
    /// Full move list after the move, replacing the stored one.
    pub pgn: String,
    /// Side expected to move next.
    pub current_turn: String,
    /// Accepted for compatibility and ignored: a stored game is always live.
    #[serde(default)]
    pub is_game_live: Option<bool>,
}

impl Validate for TurnRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.pgn.len() > MAX_PGN_BYTES {
            let mut err = ValidationError::new("pgn_length");
            err.message = Some(format!("PGN must not exceed {MAX_PGN_BYTES} bytes").into());
            errors.add("pgn", err);
        }

        if self.current_turn.chars().count() > MAX_TURN_LENGTH {
            let mut err = ValidationError::new("current_turn_length");
            err.message =
                Some(format!("currentTurn must not exceed {MAX_TURN_LENGTH} characters").into());
            errors.add("currentTurn", err);
        } else if let Err(err) = validate_token(&self.current_turn) {
            errors.add("currentTurn", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl TurnRequest {
    /// Bind the request to the game addressed by the path.
    pub fn into_entity(self, path_id: u64) -> Result<GameEntity, ServiceError> {
        if let Some(body_id) = self.id {
            if body_id != path_id {
                return Err(ServiceError::InvalidInput(format!(
                    "body id `{body_id}` does not match path id `{path_id}`"
                )));
            }
        }

        Ok(GameEntity {
            id: path_id,
            pgn: self.pgn,
            current_turn: self.current_turn,
            is_game_live: true,
        })
    }
}

/// Acknowledgement returned once a turn has been written.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WriteAck {
    /// Always true; failures are reported through the error body.
    pub success: bool,
    /// Game that was written.
    pub id: u64,
    /// Records matched by the replace.
    pub matched_count: u64,
    /// Records rewritten by the replace.
    pub modified_count: u64,
}

impl WriteAck {
    /// Ack for a single replaced record.
    pub fn replaced(id: u64) -> Self {
        Self {
            success: true,
            id,
            matched_count: 1,
            modified_count: 1,
        }
    }
}

/// Outcome of `DELETE /end/...` and `DELETE /quit/...`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EndGameResult {
    /// Whether the record was removed.
    pub success: bool,
    /// True when the game was abandoned rather than finished.
    pub is_quit: bool,
    /// Player named in the request path.
    pub ending_player: String,
    /// Empty on success.
    pub failure_message: String,
}

impl EndGameResult {
    /// Successful termination.
    pub fn ended(ending_player: String, is_quit: bool) -> Self {
        Self {
            success: true,
            is_quit,
            ending_player,
            failure_message: String::new(),
        }
    }

    /// Failed termination carrying a client-safe `message`.
    pub fn failed(ending_player: String, is_quit: bool, message: String) -> Self {
        Self {
            success: false,
            is_quit,
            ending_player,
            failure_message: message,
        }
    }
}

/// Checks the `endingPlayer` path segment.
pub fn validate_ending_player(player: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if player.chars().count() > MAX_PLAYER_LENGTH {
        let mut err = ValidationError::new("ending_player_length");
        err.message =
            Some(format!("endingPlayer must not exceed {MAX_PLAYER_LENGTH} characters").into());
        errors.add("endingPlayer", err);
    } else if let Err(err) = validate_token(player) {
        errors.add("endingPlayer", err);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
