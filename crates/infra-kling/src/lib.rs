// OpenReel Infrastructure - Kling Adapter
// Implements: VideoProvider over the Kling HTTP API

mod provider;
pub mod signer;

pub use provider::{KlingProvider, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT, KLING_PROVIDER_ID};
pub use signer::{sign, TokenError};
