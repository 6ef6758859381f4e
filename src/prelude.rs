//! OpenToken Prelude
//!
//! The prelude module provides a convenient way to import commonly used types.
//!
//! # Example
//!
//! ```rust
//! use opentoken::prelude::*;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = OpenToken::builder("Password1")
//!     .cipher(CipherSuite::Aes256Cbc)
//!     .build()?;
//! let text = ctx.encode(&AttributeMap::from([(
//!     ReservedAttribute::Subject.key().to_string(),
//!     "john".to_string(),
//! )]))?;
//! let token: Token = ctx.decode(&text)?;
//! # Ok(())
//! # }
//! ```

// Re-export core types
pub use crate::cipher::CipherSuite;
pub use crate::codec::{OpenToken, OpenTokenBuilder, TokenLifetime};
pub use crate::config::TokenConfig;
pub use crate::payload::AttributeMap;
pub use crate::token::{ReservedAttribute, Token};
pub use crate::validation::TemporalPolicy;

// Re-export error types
pub use crate::error::{ConfigError, InvalidTokenError, OpenTokenError, TokenExpiredError};
