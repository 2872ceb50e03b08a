pub mod help;
pub mod login;
pub mod logout;
