use thiserror::Error;
use tracing::warn;

use crate::dao::models::{AnswerEntity, PlayerEntity, QuestionEntity, QuizEntity};

/// Identifier of a stored player.
pub type PlayerId = u64;
/// Identifier of a stored quiz; also the lobby slot key.
pub type QuizId = u64;
/// Identifier of a stored question.
pub type QuestionId = u64;
/// Identifier of a live match, the smallest free integer at creation.
pub type MatchId = u32;

/// Number of answers every playable question carries.
pub const ANSWERS_PER_QUESTION: usize = 4;

/// Player identity resolved from the quiz store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Stable identifier.
    pub id: PlayerId,
    /// Display name shown in lobbies.
    pub nickname: String,
}

/// A single answer option.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    /// 1-based position inside the question.
    pub id: u32,
    /// Answer text.
    pub content: String,
    /// Whether picking this answer is correct.
    pub correct: bool,
}

/// A playable question with exactly four answers, one of them correct.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    /// Question identifier.
    pub id: QuestionId,
    /// Question text.
    pub questioning: String,
    /// Topic the question belongs to.
    pub topic: String,
    /// Exactly four answers in display order.
    pub answers: Vec<Answer>,
    /// Difficulty measured from play.
    pub dynamic_difficulty: f64,
    /// Difficulty assigned by the author.
    pub static_difficulty: f64,
    /// Seconds a player has to answer.
    pub response_time: u64,
    /// Points for a correct answer.
    pub worth: u32,
}

/// Quiz definition with its playable questions in storage order.
#[derive(Debug, Clone, PartialEq)]
pub struct Quiz {
    /// Quiz identifier, also the lobby slot.
    pub id: QuizId,
    /// Title, matched against question topics.
    pub title: String,
    /// Number of questions a match plays.
    pub length: usize,
    /// Lobby quorum.
    pub min_participants: usize,
    /// Playable questions in storage order.
    pub questions: Vec<Question>,
}

/// Reasons a stored question is not playable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidQuestion {
    /// Wrong number of answers.
    #[error("question `{id}` has {count} answers, expected 4")]
    AnswerCount {
        /// Offending question.
        id: QuestionId,
        /// Answers found.
        count: usize,
    },
    /// Zero or several answers marked correct.
    #[error("question `{id}` has {count} correct answers, expected exactly one")]
    CorrectCount {
        /// Offending question.
        id: QuestionId,
        /// Correct answers found.
        count: usize,
    },
}

impl Quiz {
    /// Build a quiz from its stored header and topic questions, skipping unplayable questions.
    pub fn from_entities(quiz: QuizEntity, questions: Vec<QuestionEntity>) -> Self {
        let questions = questions
            .into_iter()
            .filter_map(|entity| match Question::try_from(entity) {
                Ok(question) => Some(question),
                Err(err) => {
                    warn!(quiz_id = quiz.id, error = %err, "skipping unplayable question");
                    None
                }
            })
            .collect();

        Self {
            id: quiz.id,
            title: quiz.title,
            length: quiz.length,
            min_participants: quiz.min_participants,
            questions,
        }
    }

    /// Questions a new match plays: the first `length` ones, clamped to what exists.
    pub fn match_questions(&self) -> Vec<Question> {
        self.questions.iter().take(self.length).cloned().collect()
    }
}

impl TryFrom<QuestionEntity> for Question {
    type Error = InvalidQuestion;

    fn try_from(value: QuestionEntity) -> Result<Self, Self::Error> {
        if value.answers.len() != ANSWERS_PER_QUESTION {
            return Err(InvalidQuestion::AnswerCount {
                id: value.id,
                count: value.answers.len(),
            });
        }

        let correct = value.answers.iter().filter(|a| a.correct).count();
        if correct != 1 {
            return Err(InvalidQuestion::CorrectCount {
                id: value.id,
                count: correct,
            });
        }

        Ok(Self {
            id: value.id,
            questioning: value.questioning,
            topic: value.topic,
            answers: value.answers.into_iter().map(Into::into).collect(),
            dynamic_difficulty: value.dynamic_difficulty,
            static_difficulty: value.static_difficulty,
            response_time: value.response_time,
            worth: value.worth,
        })
    }
}

impl From<AnswerEntity> for Answer {
    fn from(value: AnswerEntity) -> Self {
        Self {
            id: value.id,
            content: value.content,
            correct: value.correct,
        }
    }
}

impl From<PlayerEntity> for Player {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id,
            nickname: value.nickname,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A playable question whose first answer is the correct one.
    pub fn question(id: QuestionId) -> Question {
        Question {
            id,
            questioning: format!("Question {id}?"),
            topic: "Trivia".into(),
            answers: (1..=ANSWERS_PER_QUESTION as u32)
                .map(|answer_id| Answer {
                    id: answer_id,
                    content: format!("Answer {answer_id}"),
                    correct: answer_id == 1,
                })
                .collect(),
            dynamic_difficulty: 1.0,
            static_difficulty: 1.0,
            response_time: 20,
            worth: 100,
        }
    }

    pub fn quiz(id: QuizId, length: usize, min_participants: usize) -> Quiz {
        Quiz {
            id,
            title: "Trivia".into(),
            length,
            min_participants,
            questions: (1..=length as u64).map(question).collect(),
        }
    }

    pub fn player(id: PlayerId) -> Player {
        Player {
            id,
            nickname: format!("player-{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(answers: &[bool]) -> QuestionEntity {
        QuestionEntity {
            id: 7,
            questioning: "Largest planet?".into(),
            topic: "Space".into(),
            answers: answers
                .iter()
                .enumerate()
                .map(|(i, correct)| AnswerEntity {
                    id: i as u32 + 1,
                    content: format!("option {i}"),
                    correct: *correct,
                })
                .collect(),
            dynamic_difficulty: 0.5,
            static_difficulty: 2.0,
            response_time: 15,
            worth: 150,
        }
    }

    #[test]
    fn accepts_four_answers_with_one_correct() {
        let question = Question::try_from(entity(&[false, false, true, false])).unwrap();
        assert_eq!(question.answers.len(), 4);
        assert!(question.answers[2].correct);
    }

    #[test]
    fn rejects_wrong_answer_count() {
        let err = Question::try_from(entity(&[true, false, false])).unwrap_err();
        assert_eq!(err, InvalidQuestion::AnswerCount { id: 7, count: 3 });
    }

    #[test]
    fn rejects_zero_or_multiple_correct_answers() {
        assert_eq!(
            Question::try_from(entity(&[false; 4])).unwrap_err(),
            InvalidQuestion::CorrectCount { id: 7, count: 0 }
        );
        assert_eq!(
            Question::try_from(entity(&[true, true, false, false])).unwrap_err(),
            InvalidQuestion::CorrectCount { id: 7, count: 2 }
        );
    }

    #[test]
    fn match_questions_skip_invalid_and_clamp_to_length() {
        let quiz = Quiz::from_entities(
            QuizEntity {
                id: 1,
                title: "Space".into(),
                length: 5,
                min_participants: 2,
            },
            vec![
                entity(&[true, false, false, false]),
                entity(&[false; 4]),
                entity(&[false, true, false, false]),
            ],
        );

        assert_eq!(quiz.questions.len(), 2);
        assert_eq!(quiz.match_questions().len(), 2);
    }
}
