use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dao::{game_store::couchdb::error::CouchDaoError, models::GameEntity};

pub const GAME_PREFIX: &str = "game::";
pub const END_SUFFIX: &str = "\u{ffff}";
/// Digits in `u64::MAX`; padding to this width keeps lexical and numeric order aligned.
const ID_WIDTH: usize = 20;

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    pub id: String,
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Minimal projection used to read the current revision of a document.
#[derive(Debug, Deserialize)]
pub struct RevisionOnly {
    #[serde(rename = "_rev")]
    pub rev: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchGameDocument {
    #[serde(rename = "_id")]
    pub doc_id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub game: GameBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameBody {
    pub id: u64,
    pub pgn: String,
    #[serde(rename = "currentTurn")]
    pub current_turn: String,
    #[serde(rename = "isGameLive")]
    pub is_game_live: bool,
}

impl From<(GameEntity, Option<String>)> for CouchGameDocument {
    fn from((game, rev): (GameEntity, Option<String>)) -> Self {
        Self {
            doc_id: game_doc_id(game.id),
            rev,
            game: GameBody {
                id: game.id,
                pgn: game.pgn,
                current_turn: game.current_turn,
                is_game_live: game.is_game_live,
            },
        }
    }
}

impl TryFrom<CouchGameDocument> for GameEntity {
    type Error = CouchDaoError;

    fn try_from(doc: CouchGameDocument) -> Result<Self, Self::Error> {
        if extract_id(&doc.doc_id)? != doc.game.id {
            return Err(CouchDaoError::InvalidDocId {
                doc_id: doc.doc_id,
            });
        }

        Ok(Self {
            id: doc.game.id,
            pgn: doc.game.pgn,
            current_turn: doc.game.current_turn,
            is_game_live: doc.game.is_game_live,
        })
    }
}

pub fn game_doc_id(id: u64) -> String {
    format!("{GAME_PREFIX}{id:0width$}", width = ID_WIDTH)
}

pub fn extract_id(doc_id: &str) -> Result<u64, CouchDaoError> {
    doc_id
        .strip_prefix(GAME_PREFIX)
        .and_then(|digits| digits.parse::<u64>().ok())
        .ok_or_else(|| CouchDaoError::InvalidDocId {
            doc_id: doc_id.to_string(),
        })
}
