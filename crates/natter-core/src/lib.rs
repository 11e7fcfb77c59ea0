pub mod config;
pub mod conversation;
pub mod error;
pub mod state;
pub mod transport;
pub mod typing;

// Re-export main types for convenience
pub use config::Config;
pub use conversation::{apply_outcome, Conversation, PendingSend, SendOutcome, TurnPair};
pub use error::TransportError;
pub use state::{ChatRole, ChatTurn, TurnId, TurnStatus};
pub use transport::{ChatTransport, HttpTransport};
pub use typing::TypingIndicator;
