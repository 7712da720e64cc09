use quicklaunch_core::TabId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No tab with id {0}")]
    TabNotFound(TabId),

    #[error("Messaging error: {0}")]
    Messaging(String),

    #[error("Coordinator has stopped")]
    CoordinatorStopped,

    #[error(transparent)]
    Core(#[from] quicklaunch_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
