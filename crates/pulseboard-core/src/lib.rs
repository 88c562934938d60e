pub mod config;
pub mod constants;
pub mod emitter;
pub mod format;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod scheduler;
pub mod store;
pub mod views;

pub use emitter::{ChangeEmitter, Subscription};
pub use gateway::{Gateway, GatewayError, HttpGateway, MemoryGateway};
pub use scheduler::{ActivitySignal, PollTask, PollingScheduler, SchedulerPhase};
pub use store::{AppState, JsonFileStore, KeyValueStore, MemoryStore, Store};
