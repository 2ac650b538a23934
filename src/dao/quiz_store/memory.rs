//! Process-local [`QuizStore`] used by tests and storage-less local runs.

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::RwLock;

use crate::dao::{
    models::{NewPlayer, NewQuestion, NewQuiz, PlayerEntity, QuestionEntity, QuizEntity},
    quiz_store::QuizStore,
    storage::StorageResult,
};

#[derive(Default)]
struct Tables {
    players: Vec<PlayerEntity>,
    quizzes: Vec<QuizEntity>,
    questions: Vec<QuestionEntity>,
    highest_player_id: u64,
    highest_quiz_id: u64,
    highest_question_id: u64,
}

/// In-memory store; every clone shares the same tables.
#[derive(Clone, Default)]
pub struct MemoryQuizStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryQuizStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl QuizStore for MemoryQuizStore {
    fn find_player(&self, id: u64) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let tables = tables.read().await;
            Ok(tables.players.iter().find(|p| p.id == id).cloned())
        })
    }

    fn find_player_id_by_nickname(
        &self,
        nickname: String,
    ) -> BoxFuture<'static, StorageResult<Option<u64>>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let tables = tables.read().await;
            Ok(tables
                .players
                .iter()
                .find(|p| p.nickname == nickname)
                .map(|p| p.id))
        })
    }

    fn ensure_player(&self, player: NewPlayer) -> BoxFuture<'static, StorageResult<u64>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let mut tables = tables.write().await;
            if let Some(existing) = tables.players.iter().find(|p| p.nickname == player.nickname) {
                return Ok(existing.id);
            }
            tables.highest_player_id += 1;
            let id = tables.highest_player_id;
            tables.players.push(player.into_entity(id));
            Ok(id)
        })
    }

    fn find_quiz(&self, id: u64) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let tables = tables.read().await;
            Ok(tables.quizzes.iter().find(|q| q.id == id).cloned())
        })
    }

    fn list_quizzes(&self) -> BoxFuture<'static, StorageResult<Vec<QuizEntity>>> {
        let tables = self.tables.clone();
        Box::pin(async move { Ok(tables.read().await.quizzes.clone()) })
    }

    fn ensure_quiz(&self, quiz: NewQuiz) -> BoxFuture<'static, StorageResult<u64>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let mut tables = tables.write().await;
            if let Some(existing) = tables.quizzes.iter().find(|q| q.title == quiz.title) {
                return Ok(existing.id);
            }
            tables.highest_quiz_id += 1;
            let id = tables.highest_quiz_id;
            tables.quizzes.push(quiz.into_entity(id));
            Ok(id)
        })
    }

    fn find_question(&self, id: u64) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let tables = tables.read().await;
            Ok(tables.questions.iter().find(|q| q.id == id).cloned())
        })
    }

    fn ensure_question(&self, question: NewQuestion) -> BoxFuture<'static, StorageResult<u64>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let mut tables = tables.write().await;
            if let Some(existing) = tables
                .questions
                .iter()
                .find(|q| q.questioning == question.questioning)
            {
                return Ok(existing.id);
            }
            tables.highest_question_id += 1;
            let id = tables.highest_question_id;
            tables.questions.push(question.into_entity(id));
            Ok(id)
        })
    }

    fn questions_for_topic(
        &self,
        topic: String,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let tables = tables.read().await;
            Ok(tables
                .questions
                .iter()
                .filter(|q| q.topic == topic)
                .cloned()
                .collect())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
