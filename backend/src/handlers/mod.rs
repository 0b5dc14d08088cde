pub mod admin;
pub mod auth;
pub mod category;
pub mod follow;
pub mod forum;
pub mod permission;
pub mod profile;
pub mod statistic;
pub mod topic;
pub mod user;

pub(crate) mod uploads;
