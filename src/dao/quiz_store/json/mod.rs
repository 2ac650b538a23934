//! JSON record-file backend: one `{highest_id, <records>}` document per entity kind.

mod error;
mod records;
mod store;

pub use error::JsonStoreError;
pub use store::JsonQuizStore;
