//! Row types decoded from stored rows.

mod company;
mod invitation;
mod poll;
mod user;

pub use company::Company;
pub use invitation::Invitation;
pub use poll::{Choice, Poll, PollStatus, Question, QuestionType, Response};
pub use user::{roles_joined, Role, User};
pub(crate) use user::roles_column;

use crate::store::TableDef;
use serde::de::DeserializeOwned;

/// A row type bound to its table.
pub trait Model: DeserializeOwned + Send + Sync + 'static {
    const TABLE: &'static TableDef;

    fn id(&self) -> i64;
}
