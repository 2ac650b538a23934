use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    dto::ws::QuestionPayload,
    state::{
        items::ItemKind,
        model::{MatchId, PlayerId, Quiz, QuizId},
    },
};

/// Optional quiz selector for `GET /quizzes`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QuizQuery {
    /// Return only this quiz.
    pub id: Option<QuizId>,
}

/// Quiz with its playable questions.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuizResponse {
    /// Quiz identifier.
    pub id: QuizId,
    /// Quiz title.
    pub title: String,
    /// Number of questions a match plays.
    pub length: usize,
    /// Players needed to start a match.
    pub min_participants: usize,
    /// Playable questions in storage order.
    pub questions: Vec<QuestionPayload>,
}

impl From<&Quiz> for QuizResponse {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title.clone(),
            length: quiz.length,
            min_participants: quiz.min_participants,
            questions: quiz.questions.iter().map(QuestionPayload::from).collect(),
        }
    }
}

/// `GET /quizzes` body: a single quiz when one was selected, otherwise the catalogue.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum QuizListing {
    /// Quiz selected with `?id=`.
    One(QuizResponse),
    /// Every stored quiz.
    All(Vec<QuizResponse>),
}

/// Nickname lookup performed by the login screen.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    /// Nickname to look up.
    #[validate(length(min = 1, max = 64))]
    pub username: String,
}

/// Player id for a login, `-1` when the nickname is unknown.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct LoginResponse {
    /// Player id, or `-1`.
    pub p_id: i64,
}

impl LoginResponse {
    /// Response for a nickname nobody registered.
    pub fn unknown() -> Self {
        Self { p_id: -1 }
    }
}

/// Player registration; registering an existing nickname returns its id.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RegisterPlayerRequest {
    /// Display name; must be unique.
    #[validate(length(min = 1, max = 64))]
    pub nickname: String,
    /// Optional password.
    #[serde(default)]
    pub password: Option<String>,
    /// Optional contact address.
    #[serde(default)]
    #[validate(email)]
    pub mail: Option<String>,
}

/// Id of the registered player.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct RegisterPlayerResponse {
    /// Registered player id.
    pub p_id: PlayerId,
}

/// Asks whether a player can activate an item in a match.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ItemQuantityRequest {
    /// Player asking.
    pub p_id: PlayerId,
    /// Match the item belongs to.
    pub game_id: MatchId,
    /// Item to check.
    pub item: ItemKind,
}

/// Whether the item can be activated.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct ItemQuantityResponse {
    /// True when the player holds at least one unit.
    pub activate: bool,
}
