pub mod authcode;
pub mod session;
