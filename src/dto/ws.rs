use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;
use thiserror::Error;
use utoipa::ToSchema;

use crate::state::{
    items::ItemKind,
    model::{Answer, MatchId, PlayerId, Question, QuestionId, QuizId},
};

/// Points per roster member, in roster order.
pub type Scoreboard = IndexMap<PlayerId, i64>;

/// Messages accepted from player WebSocket clients.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join the waiting room of a quiz.
    JoinLobby {
        /// Joining player.
        p_id: PlayerId,
        /// Quiz whose lobby to join.
        q_id: QuizId,
    },
    /// Leave a waiting room; without `q_id` every lobby the player waits in is searched.
    LeaveLobby {
        /// Leaving player.
        p_id: PlayerId,
        /// Lobby to leave.
        #[serde(default)]
        q_id: Option<QuizId>,
    },
    /// Report the outcome of the current question for one player.
    AnsweredQuestion {
        /// Answering player.
        p_id: PlayerId,
        /// Match being played.
        game_id: MatchId,
        /// Question the answer is for; must be the current one.
        q_id: QuestionId,
        /// Client-side outcome.
        played_question: PlayedQuestion,
    },
    /// Spend an item; `game_id` defaults to the match the player is in.
    ItemActivation {
        /// Player spending the item.
        p_id: PlayerId,
        /// Item to spend.
        item: ItemKind,
        /// Match to spend it in.
        #[serde(default)]
        game_id: Option<MatchId>,
    },
    /// Free-form chat payload, relayed verbatim.
    UserMessage {
        /// Every field besides `type`.
        #[serde(flatten)]
        #[schema(value_type = Object)]
        body: Map<String, Value>,
    },
}

/// Outcome of one answered question as computed by the client.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, PartialEq)]
pub struct PlayedQuestion {
    /// Points earned for this question.
    pub score: i64,
    /// Whether the picked answer was correct.
    pub is_correct: bool,
    /// Whether the player bet on the jackpot.
    pub is_jackpot: bool,
    /// Item won by picking the hinted answer.
    #[serde(default)]
    pub acquired_item: Option<ItemKind>,
}

const KNOWN_TYPES: [&str; 5] = [
    "join_lobby",
    "leave_lobby",
    "answered_question",
    "item_activation",
    "user_message",
];

/// Reasons an inbound frame is dropped.
#[derive(Debug, Error)]
pub enum InboundError {
    /// Not JSON at all.
    #[error("message is not valid JSON")]
    Malformed(#[source] serde_json::Error),
    /// JSON without a string `type` discriminator.
    #[error("message has no `type` key")]
    MissingType,
    /// Discriminator outside the known set.
    #[error("could not resolve message type `{0}`")]
    UnknownType(String),
    /// Known type but required fields are missing or mistyped.
    #[error("`{kind}` message is missing required fields")]
    MissingFields {
        /// Value of the `type` key.
        kind: String,
        /// Deserialization failure.
        #[source]
        source: serde_json::Error,
    },
}

impl ClientMessage {
    /// Parse a text frame, classifying every way it can be rejected.
    pub fn from_json_str(text: &str) -> Result<Self, InboundError> {
        let value: Value = serde_json::from_str(text).map_err(InboundError::Malformed)?;
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(InboundError::MissingType)?
            .to_owned();

        if !KNOWN_TYPES.contains(&kind.as_str()) {
            return Err(InboundError::UnknownType(kind));
        }

        serde_json::from_value(value).map_err(|source| InboundError::MissingFields { kind, source })
    }
}

/// Messages pushed to player WebSocket clients.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Current lobby roster: ids and nicknames in join order.
    Lobby {
        /// Player ids.
        lobby: Vec<PlayerId>,
        /// Nicknames, same order as `lobby`.
        nicks: Vec<String>,
    },
    /// A match was created for the receiving players.
    GameStart {
        /// Id to send with answers and item activations.
        game_id: MatchId,
    },
    /// Next question, with the jackpot state and the scores so far.
    Question {
        /// Question to answer.
        question: QuestionPayload,
        /// Jackpot state for this question.
        jackpot: JackpotSnapshot,
        /// Scores before this question.
        #[schema(value_type = Object)]
        scoreboard: Scoreboard,
    },
    /// Final scores once the last question has been answered.
    Scoreboard {
        /// Final scores.
        #[schema(value_type = Object)]
        scoreboard: Scoreboard,
    },
    /// Another player spent an item.
    ItemActivation {
        /// Item that was spent.
        item: ItemKind,
    },
}

/// Jackpot state shown with each question.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
pub struct JackpotSnapshot {
    /// Points in the pool.
    pub amount: u64,
    /// Whether a correct jackpot bet pays out now.
    pub is_active: bool,
}

/// Question as sent to players.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPayload {
    /// Question identifier.
    pub id: QuestionId,
    /// Question text.
    pub questioning: String,
    /// Topic the question belongs to.
    pub topic: String,
    /// Four answers in display order.
    pub answers: Vec<AnswerPayload>,
    /// Difficulty measured from play.
    pub dynamic_difficulty: f64,
    /// Difficulty assigned by the author.
    pub static_difficulty: f64,
    /// Seconds to answer.
    pub response_time: u64,
    /// Points for a correct answer.
    pub worth: u32,
}

/// Answer as sent to players, optionally carrying an item hint.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct AnswerPayload {
    /// 1-based position inside the question.
    pub id: u32,
    /// Answer text.
    pub content: String,
    /// Whether this answer is correct; sent as `type`.
    #[serde(rename = "type")]
    pub correct: bool,
    /// Item won by picking this answer.
    pub assigned_effect: Option<ItemKind>,
}

impl From<&Answer> for AnswerPayload {
    fn from(answer: &Answer) -> Self {
        Self {
            id: answer.id,
            content: answer.content.clone(),
            correct: answer.correct,
            assigned_effect: None,
        }
    }
}

impl From<&Question> for QuestionPayload {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id,
            questioning: question.questioning.clone(),
            topic: question.topic.clone(),
            answers: question.answers.iter().map(AnswerPayload::from).collect(),
            dynamic_difficulty: question.dynamic_difficulty,
            static_difficulty: question.static_difficulty,
            response_time: question.response_time,
            worth: question.worth,
        }
    }
}

impl QuestionPayload {
    /// Index of the answer carrying an item hint, if any.
    pub fn hinted_answer(&self) -> Option<usize> {
        self.answers
            .iter()
            .position(|answer| answer.assigned_effect.is_some())
    }
}
