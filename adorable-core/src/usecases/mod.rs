mod activities;
mod chats;
mod error;
mod files;
mod locations;
mod login;
mod notifications;
mod places;
mod profile;
mod rankings;
mod register;
mod reviews;
mod saved_places;
mod social;
mod user_tokens;


pub type Result<T> = std::result::Result<T, Error>;

pub use self::{
    activities::*, chats::*, error::Error, files::*, locations::*, login::*, notifications::*,
    places::*, profile::*, rankings::*, register::*, reviews::*, saved_places::*, social::*,
    user_tokens::*,
};

mod prelude {
    pub use super::error::Error;
    pub type Result<T> = std::result::Result<T, Error>;
    pub use crate::{
        db::*,
        entities::*,
        repositories::{Error as RepoError, *},
        util::validate,
    };
}
use self::prelude::*;

/// Default and max. number of items of a listing.
pub const DEFAULT_LIMIT: u32 = 50;
pub const MAX_LIMIT: u32 = 500;

pub fn effective_limit(limit: Option<u32>) -> Result<u32> {
    match limit {
        None => Ok(DEFAULT_LIMIT),
        Some(0) => Err(Error::InvalidLimit),
        Some(l) => Ok(l.min(MAX_LIMIT)),
    }
}

/// Load a user that has to exist, e.g. the one behind a valid token.
pub fn get_user<R: UserRepo>(repo: &R, id: &Id) -> Result<User> {
    Ok(repo.get_user(id)?)
}
