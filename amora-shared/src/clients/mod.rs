pub mod db;
pub mod email;
pub mod push;
pub mod storage;
