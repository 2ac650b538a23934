/// Database model definitions.
pub mod models;
/// Quiz, question and player lookups backing the lobbies and matches.
pub mod quiz_store;
/// Storage abstraction layer for backend failures.
pub mod storage;
