pub use adorable_core::{db, repositories, usecases};

pub mod entities {
    pub use adorable_core::entities::*;
}

pub mod prelude {
    use std::result;

    pub use adorable_application::error::*;

    pub use super::{db::*, entities::*, repositories::*};

    pub type Result<T> = result::Result<T, AppError>;
}
