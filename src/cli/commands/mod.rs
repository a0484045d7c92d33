//! CLI command implementations

pub mod build;
pub mod check;
pub mod init;
pub mod key;

pub use build::execute as build;
pub use check::execute as check;
pub use init::execute as init;
pub use key::execute as key;
