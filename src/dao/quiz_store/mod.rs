/// Record files on disk.
#[cfg(feature = "json-store")]
pub mod json;
/// In-process tables.
pub mod memory;

use futures::future::BoxFuture;

use crate::dao::models::{
    NewPlayer, NewQuestion, NewQuiz, PlayerEntity, QuestionEntity, QuizEntity,
};
use crate::dao::storage::StorageResult;

/// Repository of players, quizzes and questions consumed by lobbies and matches.
///
/// `ensure_*` operations are idempotent on the natural key (nickname, title,
/// questioning): an existing record wins and its id is returned unchanged.
pub trait QuizStore: Send + Sync {
    fn find_player(&self, id: u64) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;
    fn find_player_id_by_nickname(
        &self,
        nickname: String,
    ) -> BoxFuture<'static, StorageResult<Option<u64>>>;
    fn ensure_player(&self, player: NewPlayer) -> BoxFuture<'static, StorageResult<u64>>;
    fn find_quiz(&self, id: u64) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>>;
    fn list_quizzes(&self) -> BoxFuture<'static, StorageResult<Vec<QuizEntity>>>;
    fn ensure_quiz(&self, quiz: NewQuiz) -> BoxFuture<'static, StorageResult<u64>>;
    fn find_question(&self, id: u64) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>>;
    fn ensure_question(&self, question: NewQuestion) -> BoxFuture<'static, StorageResult<u64>>;
    /// Questions whose topic equals `topic`, in storage order.
    fn questions_for_topic(
        &self,
        topic: String,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
