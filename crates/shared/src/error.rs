use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("unknown wire symbol: {0}")]
    UnknownSymbol(String),
}
