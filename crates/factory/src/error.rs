use micro_message::error::MessageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FactoryBuildError {
    #[error("invalid default protocol version: {source}")]
    InvalidProtocolVersion {
        #[from]
        source: MessageError,
    },
}
