mod decoder;
mod error;
mod parsing;
mod types;

pub use decoder::{decode, decode_environment, AZ_ALT_PAYLOAD_LEN};
pub use error::DecodeError;
pub use parsing::parse_hex_payload;
pub use types::{EnvSample, RawSample};
