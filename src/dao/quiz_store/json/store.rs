use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::BoxFuture;
use tokio::{fs, sync::Mutex};
use tracing::{debug, info};

use crate::dao::{
    models::{NewPlayer, NewQuestion, NewQuiz, PlayerEntity, QuestionEntity, QuizEntity},
    quiz_store::QuizStore,
    storage::StorageResult,
};

use super::{
    error::{JsonResult, JsonStoreError},
    records::{PlayerFile, QuestionFile, QuizFile, RecordFile},
};

/// Quiz store persisting each entity kind to its own JSON document.
///
/// Every append is a read-modify-write of a single file performed under that
/// file's lock and published with an atomic rename, so the record list and its
/// `highest_id` counter never diverge on disk.
#[derive(Clone)]
pub struct JsonQuizStore {
    dir: Arc<PathBuf>,
    players: Arc<Mutex<()>>,
    quizzes: Arc<Mutex<()>>,
    questions: Arc<Mutex<()>>,
}

impl JsonQuizStore {
    /// Open the store rooted at `dir`, failing when the directory is missing.
    pub async fn open(dir: impl Into<PathBuf>) -> JsonResult<Self> {
        let dir = dir.into();
        let store = Self {
            dir: Arc::new(dir),
            players: Arc::new(Mutex::new(())),
            quizzes: Arc::new(Mutex::new(())),
            questions: Arc::new(Mutex::new(())),
        };
        store.check_directory().await?;
        info!(path = %store.dir.display(), "opened JSON quiz store");
        Ok(store)
    }

    fn path_of<F: RecordFile>(&self) -> PathBuf {
        self.dir.join(F::FILE_NAME)
    }

    async fn check_directory(&self) -> JsonResult<()> {
        let metadata = fs::metadata(self.dir.as_path()).await.map_err(|source| {
            JsonStoreError::MissingDirectory {
                path: self.dir.as_ref().clone(),
                source,
            }
        })?;
        if metadata.is_dir() {
            Ok(())
        } else {
            Err(JsonStoreError::MissingDirectory {
                path: self.dir.as_ref().clone(),
                source: std::io::Error::new(ErrorKind::NotADirectory, "not a directory"),
            })
        }
    }

    async fn load<F: RecordFile>(&self) -> JsonResult<F> {
        read_document(&self.path_of::<F>()).await
    }

    /// Return the id of the first record matching `existing`, or append a new one.
    async fn ensure<F, M, B>(&self, lock: &Mutex<()>, existing: M, build: B) -> JsonResult<u64>
    where
        F: RecordFile,
        M: Fn(&F::Record) -> Option<u64>,
        B: FnOnce(u64) -> F::Record,
    {
        let _guard = lock.lock().await;
        let path = self.path_of::<F>();
        let mut document: F = read_document(&path).await?;

        if let Some(id) = document.records().iter().find_map(&existing) {
            return Ok(id);
        }

        let id = document.append_with(build);
        write_document(&path, &document).await?;
        debug!(path = %path.display(), id, highest_id = document.highest_id(), "stored record");
        Ok(id)
    }
}

async fn read_document<F: RecordFile>(path: &Path) -> JsonResult<F> {
    let contents = match fs::read(path).await {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(F::default()),
        Err(source) => {
            return Err(JsonStoreError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    serde_json::from_slice(&contents).map_err(|source| JsonStoreError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

async fn write_document<F: RecordFile>(path: &Path, document: &F) -> JsonResult<()> {
    let payload = serde_json::to_vec_pretty(document).map_err(|source| JsonStoreError::Encode {
        path: path.to_path_buf(),
        source,
    })?;

    let staging = path.with_extension("json.tmp");
    fs::write(&staging, payload)
        .await
        .map_err(|source| JsonStoreError::Write {
            path: staging.clone(),
            source,
        })?;
    fs::rename(&staging, path)
        .await
        .map_err(|source| JsonStoreError::Write {
            path: path.to_path_buf(),
            source,
        })
}

impl QuizStore for JsonQuizStore {
    fn find_player(&self, id: u64) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let file: PlayerFile = store.load().await?;
            Ok(file.players.into_iter().find(|p| p.id == id))
        })
    }

    fn find_player_id_by_nickname(
        &self,
        nickname: String,
    ) -> BoxFuture<'static, StorageResult<Option<u64>>> {
        let store = self.clone();
        Box::pin(async move {
            let file: PlayerFile = store.load().await?;
            Ok(file
                .players
                .iter()
                .find(|p| p.nickname == nickname)
                .map(|p| p.id))
        })
    }

    fn ensure_player(&self, player: NewPlayer) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            let nickname = player.nickname.clone();
            store
                .ensure::<PlayerFile, _, _>(
                    &store.players,
                    |existing| (existing.nickname == nickname).then_some(existing.id),
                    |id| player.into_entity(id),
                )
                .await
                .map_err(Into::into)
        })
    }

    fn find_quiz(&self, id: u64) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let file: QuizFile = store.load().await?;
            Ok(file.quizzes.into_iter().find(|q| q.id == id))
        })
    }

    fn list_quizzes(&self) -> BoxFuture<'static, StorageResult<Vec<QuizEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let file: QuizFile = store.load().await?;
            Ok(file.quizzes)
        })
    }

    fn ensure_quiz(&self, quiz: NewQuiz) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            let title = quiz.title.clone();
            store
                .ensure::<QuizFile, _, _>(
                    &store.quizzes,
                    |existing| (existing.title == title).then_some(existing.id),
                    |id| quiz.into_entity(id),
                )
                .await
                .map_err(Into::into)
        })
    }

    fn find_question(&self, id: u64) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let file: QuestionFile = store.load().await?;
            Ok(file.questions.into_iter().find(|q| q.id == id))
        })
    }

    fn ensure_question(&self, question: NewQuestion) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            let questioning = question.questioning.clone();
            store
                .ensure::<QuestionFile, _, _>(
                    &store.questions,
                    |existing| (existing.questioning == questioning).then_some(existing.id),
                    |id| question.into_entity(id),
                )
                .await
                .map_err(Into::into)
        })
    }

    fn questions_for_topic(
        &self,
        topic: String,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let file: QuestionFile = store.load().await?;
            Ok(file
                .questions
                .into_iter()
                .filter(|q| q.topic == topic)
                .collect())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.check_directory().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            fs::create_dir_all(store.dir.as_path())
                .await
                .map_err(|source| JsonStoreError::MissingDirectory {
                    path: store.dir.as_ref().clone(),
                    source,
                })?;
            store.check_directory().await.map_err(Into::into)
        })
    }
}
