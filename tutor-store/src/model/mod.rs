pub mod activity;
mod de;
pub mod user;
