pub mod email;
pub mod error;
pub mod jwt;
pub mod memory;
pub mod notify;
pub mod otp;
pub mod store;

pub use email::{EmailProvider, EmailService, MockEmailService, SentEmail};
pub use error::ServiceError;
pub use jwt::{JwtService, SessionClaims};
pub use memory::MemoryStore;
pub use otp::{OtpError, OtpManager};
pub use store::{AccountAction, StateFilter, Store, StoreError};
