pub mod credentials;
pub mod providers;
pub mod resolve;
pub mod send;
