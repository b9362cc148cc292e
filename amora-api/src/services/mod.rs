pub mod affinity;
pub mod credential_service;
pub mod discovery;
pub mod media;
pub mod token_service;
