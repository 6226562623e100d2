//! Business logic on top of the generic CRUD base.

mod company;
mod crud;
mod poll;
mod sweeper;
mod user;
mod validation;

pub use company::CompanyService;
pub use crud::{from_row, to_row, CrudBase, DEFAULT_LIMIT, MAX_LIMIT};
pub use poll::PollService;
pub use sweeper::{end_expired_polls, spawn_poll_sweeper};
pub use user::UserService;
pub use validation::{Format, RequestValidator, Rules, ValidationRule};
