//! Request and response bodies, plus the column sets written to the store.

mod company;
mod poll;
mod user;

pub use company::{CompanyCreate, CompanyUpdate};
pub use poll::{
    Answer, ChoiceCount, ChoiceCreate, NewChoice, NewPoll, NewQuestion, NewResponse, NoChanges, PollCreate,
    PollDetail, PollResults, PollStateChange, PollUpdate, QuestionCreate, QuestionDetail, QuestionResult,
    QuestionUpdate, StatusChange, SubmissionReceipt, SubmitResponses,
};
pub use user::{
    AccessToken, AvatarUploaded, LoginRequest, NewPassword, NewUser, PasswordRecovery, RegistrationCompletion,
    RegistrationLink, TokenBody, TokenVerificationResponse, UpdateUserProfile, UserChanges, UserCreate,
    UserCreateByEmail, UserOut, UserUpdate,
};
