// Application layer - business rules and orchestration over a LedgerStore.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
