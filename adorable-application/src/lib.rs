#[macro_use]
extern crate log;

mod chats;
mod dispatch;
mod files;
mod places;
mod social;
mod users;

pub mod prelude {
    pub use super::{chats::*, dispatch::*, files::*, places::*, social::*, users::*};
}

pub mod error;
pub mod health;
pub mod jobs;

pub type Result<T> = std::result::Result<T, error::AppError>;

pub(crate) use adorable_core::{
    db::*,
    entities::*,
    events::Event,
    fanout,
    repositories::{Error as RepoError, *},
    usecases,
};

#[cfg(test)]
pub(crate) mod tests;

pub mod sqlite {
    pub use adorable_db_sqlite::{run_embedded_database_migrations, Connections};
}
