//! Text symbols exchanged with the game server.
//!
//! One command per WebSocket text frame, no framing header. Replies from the
//! server are free-form and only their presence matters to the client.

use crate::{domain::Command, error::ProtocolError};

pub const ENTER_SYMBOL: &str = "ENTER";
pub const LEFT_SYMBOL: &str = "LEFT";
pub const RIGHT_SYMBOL: &str = "RIGHT";
pub const FIRE_SYMBOL: &str = "FIRE";

/// Prefix used by the bundled development server when acknowledging a symbol.
pub const ACK_PREFIX: &str = "ACK";

pub fn wire_symbol(command: Command) -> &'static str {
    match command {
        Command::MoveLeft => LEFT_SYMBOL,
        Command::MoveRight => RIGHT_SYMBOL,
        Command::Fire => FIRE_SYMBOL,
        Command::Start => ENTER_SYMBOL,
    }
}

pub fn parse_wire_symbol(symbol: &str) -> Result<Command, ProtocolError> {
    match symbol.trim() {
        LEFT_SYMBOL => Ok(Command::MoveLeft),
        RIGHT_SYMBOL => Ok(Command::MoveRight),
        FIRE_SYMBOL => Ok(Command::Fire),
        ENTER_SYMBOL => Ok(Command::Start),
        other => Err(ProtocolError::UnknownSymbol(other.to_string())),
    }
}

pub fn ack_reply(command: Command) -> String {
    format!("{ACK_PREFIX} {}", wire_symbol(command))
}
