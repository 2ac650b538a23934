use serde::{Deserialize, Serialize};

/// Stored player record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// System generated identifier.
    pub id: u64,
    /// Unique nickname, used as the natural key.
    pub nickname: String,
    /// Opaque credential kept for the login flow.
    #[serde(default)]
    pub password: Option<String>,
    /// Contact address.
    #[serde(default)]
    pub mail: Option<String>,
}

/// Stored quiz header. Questions are linked by `topic == title`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizEntity {
    /// System generated identifier.
    pub id: u64,
    /// Unique title, used as the natural key and as the question topic.
    pub title: String,
    /// Number of questions played per match.
    pub length: usize,
    /// Quorum needed before a lobby converts into a match.
    pub min_participants: usize,
}

/// One of the four answers of a stored question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerEntity {
    /// 1-based position inside the question.
    pub id: u32,
    /// Answer text.
    pub content: String,
    /// Correctness flag.
    #[serde(rename = "type")]
    pub correct: bool,
}

/// Stored question record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionEntity {
    /// System generated identifier.
    pub id: u64,
    /// Prompt text, used as the natural key.
    pub questioning: String,
    /// Title of the quiz this question belongs to.
    pub topic: String,
    /// Ordered answers.
    pub answers: Vec<AnswerEntity>,
    /// Difficulty learned from played matches.
    pub dynamic_difficulty: f64,
    /// Difficulty assigned by the author.
    pub static_difficulty: f64,
    /// Seconds a player has to answer.
    pub response_time: u64,
    /// Points awarded for a correct answer.
    pub worth: u32,
}

/// Payload for the idempotent player creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlayer {
    /// Unique display name.
    pub nickname: String,
    /// Optional password, stored as given.
    pub password: Option<String>,
    /// Optional contact address.
    pub mail: Option<String>,
}

/// Payload for the idempotent quiz creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuiz {
    /// Quiz title; questions are matched by topic against it.
    pub title: String,
    /// Number of questions a match plays.
    pub length: usize,
    /// Lobby quorum.
    pub min_participants: usize,
}

/// Answer payload for the idempotent question creation; ids are assigned by position.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnswer {
    /// Answer text.
    pub content: String,
    /// Whether this answer is the correct one.
    pub correct: bool,
}

/// Payload for the idempotent question creation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuestion {
    /// Question text.
    pub questioning: String,
    /// Topic the question belongs to.
    pub topic: String,
    /// Answers in display order.
    pub answers: Vec<NewAnswer>,
    /// Difficulty measured from play.
    pub dynamic_difficulty: f64,
    /// Difficulty assigned by the author.
    pub static_difficulty: f64,
    /// Seconds a player has to answer.
    pub response_time: u64,
    /// Points awarded for a correct answer.
    pub worth: u32,
}

impl NewPlayer {
    /// Materialise the record once the store has allocated an id.
    pub fn into_entity(self, id: u64) -> PlayerEntity {
        PlayerEntity {
            id,
            nickname: self.nickname,
            password: self.password,
            mail: self.mail,
        }
    }
}

impl NewQuiz {
    /// Materialise the record once the store has allocated an id.
    pub fn into_entity(self, id: u64) -> QuizEntity {
        QuizEntity {
            id,
            title: self.title,
            length: self.length,
            min_participants: self.min_participants,
        }
    }
}

impl NewQuestion {
    /// Materialise the record once the store has allocated an id.
    pub fn into_entity(self, id: u64) -> QuestionEntity {
        QuestionEntity {
            id,
            questioning: self.questioning,
            topic: self.topic,
            answers: self
                .answers
                .into_iter()
                .enumerate()
                .map(|(index, answer)| AnswerEntity {
                    id: index as u32 + 1,
                    content: answer.content,
                    correct: answer.correct,
                })
                .collect(),
            dynamic_difficulty: self.dynamic_difficulty,
            static_difficulty: self.static_difficulty,
            response_time: self.response_time,
            worth: self.worth,
        }
    }
}
