pub mod client;
pub mod iam;
