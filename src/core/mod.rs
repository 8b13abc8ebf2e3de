//! Core business logic abstractions

pub mod config;
pub mod currency;
pub mod gate;
pub mod kv;
pub mod log;
pub mod notify;
pub mod state;

// Re-export main types for cleaner imports
pub use currency::{CurrencyCode, ExchangeRate, FetchError, RateSource};
pub use gate::{AlertPolicy, Decision, SkipReason};
pub use notify::{Notification, Notifier, NotifyError};
pub use state::{NotificationState, StateStore};
