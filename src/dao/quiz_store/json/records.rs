use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::dao::models::{PlayerEntity, QuestionEntity, QuizEntity};

/// A record document holding one entity kind plus its id counter.
pub trait RecordFile: Default + Serialize + DeserializeOwned + Send + 'static {
    type Record: Clone + Send + 'static;

    /// File name inside the data directory.
    const FILE_NAME: &'static str;

    fn records(&self) -> &[Self::Record];

    fn highest_id(&self) -> u64;

    /// Append a record built for the next id and bump the counter.
    fn append_with(&mut self, build: impl FnOnce(u64) -> Self::Record) -> u64;
}

/// Contents of `players.json`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PlayerFile {
    /// Last id handed out.
    pub highest_id: u64,
    /// Registered players.
    pub players: Vec<PlayerEntity>,
}

/// Contents of `quizzes.json`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct QuizFile {
    /// Last id handed out.
    pub highest_id: u64,
    /// Stored quizzes.
    pub quizzes: Vec<QuizEntity>,
}

/// Contents of `questions.json`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct QuestionFile {
    /// Last id handed out.
    pub highest_id: u64,
    /// Stored questions, all topics mixed.
    pub questions: Vec<QuestionEntity>,
}

macro_rules! record_file {
    ($file:ty, $record:ty, $field:ident, $name:literal) => {
        impl RecordFile for $file {
            type Record = $record;

            const FILE_NAME: &'static str = $name;

            fn records(&self) -> &[Self::Record] {
                &self.$field
            }

            fn highest_id(&self) -> u64 {
                self.highest_id
            }

            fn append_with(&mut self, build: impl FnOnce(u64) -> Self::Record) -> u64 {
                let id = self.highest_id + 1;
                self.$field.push(build(id));
                self.highest_id = id;
                id
            }
        }
    };
}

record_file!(PlayerFile, PlayerEntity, players, "players.json");
record_file!(QuizFile, QuizEntity, quizzes, "quizzes.json");
record_file!(QuestionFile, QuestionEntity, questions, "questions.json");
