pub mod affinity;
pub mod cards;
pub mod health;
pub mod images;
pub mod login;
pub mod messages;
pub mod profile;
pub mod refresh;
pub mod register;
pub mod verify;
