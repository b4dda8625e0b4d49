/// Shared error type used across the gacha crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("config: {0}")]
    Config(String),

    #[error("reward table: {0}")]
    RewardTable(String),
}

pub type Result<T> = std::result::Result<T, Error>;
