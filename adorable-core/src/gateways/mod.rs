pub mod email;
pub mod geocode;
pub mod identity;
pub mod image;
pub mod notify;
pub mod push;
pub mod realtime;
pub mod storage;
