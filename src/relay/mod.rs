//! HTTP relay service.
//!
//! `POST /chat` takes `{"message"}`, forwards it to the configured
//! generator and answers `{"reply"}`.

mod handlers;
mod server;
pub mod types;

pub use handlers::relay_message;
pub use server::{create_router, run_server, AppState, RequestId, REQUEST_ID_HEADER};
pub use types::{ChatReply, ChatRequest, EMPTY_MESSAGE_REPLY};
