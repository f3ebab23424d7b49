//! # Remote Client
//!
//! Access to the content generation service.
//!
//! ## Architecture
//!
//! - **RemoteTransport / CredentialProvider**: collaborator seams, see [`traits`]
//! - **RemoteCallClient**: one logical call with deadline, retry and classification
//! - **GenerationClient**: typed generation operations on top of the remote call client
//! - **HttpTransport**: reqwest transport for the hosted function endpoint
//!
//! ## Usage
//!
//! ```rust,no_run
//! use post_planner::client::{
//!     Credential, GenerationClient, HttpTransport, RemoteCallClient, StaticCredentialProvider,
//! };
//! use post_planner::config::GenerationConfig;
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GenerationConfig::default();
//! let transport = Arc::new(HttpTransport::new(&config)?);
//! let session = Arc::new(StaticCredentialProvider::new(Credential::bearer("token")));
//!
//! let generation = GenerationClient::new(RemoteCallClient::new(transport, session));
//! # let _ = generation;
//! # Ok(())
//! # }
//! ```

pub mod generation;
pub mod http;
pub mod remote_call;
pub mod traits;

// Re-export main types for easy access
pub use generation::{GenerationClient, OperationTimeouts};
pub use http::HttpTransport;
pub use remote_call::{AttemptOutcome, CallReport, RemoteCallAttempt, RemoteCallClient};
pub use traits::{Credential, CredentialProvider, RemoteTransport, StaticCredentialProvider};
