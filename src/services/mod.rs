pub mod authenticator;
pub mod clock;
pub mod credentials;
pub mod metrics;
pub mod receipts;
pub mod session;
pub mod templates;
pub mod token;
pub mod users;
