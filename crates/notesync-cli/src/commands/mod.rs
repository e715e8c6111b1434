pub mod category;
pub mod common;
pub mod create;
pub mod delete;
pub mod dump;
pub mod edit;
pub mod export;
pub mod favorite;
pub mod import;
pub mod list;
pub mod sync;
