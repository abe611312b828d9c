// univent-api: Async Rust client for the UniVent REST API

pub mod auth;
pub mod client;
pub mod error;
pub mod events;
pub mod models;
pub mod tickets;
pub mod transport;

pub use client::ApiClient;
pub use error::Error;
pub use models::{
    EventSummary, LoginResponse, UserProfile, UserRole, ValidateTicketRequest,
    ValidateTicketResponse,
};
pub use transport::{TlsMode, TransportConfig};
