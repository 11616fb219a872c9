use mongodb::bson::{Document, doc};
use serde::{Deserialize, Serialize};

use super::error::{MongoDaoError, MongoResult};
use crate::dao::models::GameEntity;

/// Document layout of the `savedGames` collection.
///
/// BSON has no unsigned 64-bit integer, so ids are stored as int64 and
/// range-checked on the way in and out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameDocument {
    id: i64,
    pgn: String,
    #[serde(rename = "currentTurn")]
    current_turn: String,
    #[serde(rename = "isGameLive")]
    is_game_live: bool,
}

impl TryFrom<GameEntity> for MongoGameDocument {
    type Error = MongoDaoError;

    fn try_from(value: GameEntity) -> MongoResult<Self> {
        Ok(Self {
            id: bson_id(value.id)?,
            pgn: value.pgn,
            current_turn: value.current_turn,
            is_game_live: value.is_game_live,
        })
    }
}

impl TryFrom<MongoGameDocument> for GameEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoGameDocument) -> MongoResult<Self> {
        let id = u64::try_from(value.id).map_err(|_| MongoDaoError::NegativeId { id: value.id })?;
        Ok(Self {
            id,
            pgn: value.pgn,
            current_turn: value.current_turn,
            is_game_live: value.is_game_live,
        })
    }
}

pub fn bson_id(id: u64) -> MongoResult<i64> {
    i64::try_from(id).map_err(|_| MongoDaoError::IdOutOfRange { id })
}

pub fn doc_id(id: u64) -> MongoResult<Document> {
    let id = bson_id(id)?;
    Ok(doc! {"id": id})
}
