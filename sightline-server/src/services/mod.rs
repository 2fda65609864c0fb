//! Sighting pipeline services
//!
//! Request side: [`SightingValidator`] → [`SightingIngestor`] → broker.
//! Background side: broker → [`NotificationConsumer`] → [`SighterResolver`]
//! → mail.

mod animals;
mod consumer;
mod ingestor;
mod query;
mod resolver;
mod validator;

pub use animals::AnimalRegistry;
pub use consumer::{ConsumerHandle, ConsumerState, DispatchStats, NotificationConsumer};
pub use ingestor::SightingIngestor;
pub use query::SightingQuery;
pub use resolver::SighterResolver;
pub use validator::{SightingValidator, TemporalPolicy, ValidationPolicy, DEFAULT_MIN_DISTANCE_METERS};
