pub mod conversations;
pub mod messages;
pub mod notifications;
pub mod presences;
pub mod relay;
pub mod streams;
