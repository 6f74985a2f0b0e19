pub mod kv;
pub mod meta;
pub mod users;
