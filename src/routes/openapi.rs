//! OpenAPI document served at `/api/openapi.json`.

use crate::models::{Choice, Company, Poll, PollStatus, Question, QuestionType, Response, Role};
use crate::response::Message;
use crate::schemas::{
    AccessToken, Answer, AvatarUploaded, ChoiceCount, ChoiceCreate, CompanyCreate, CompanyUpdate, LoginRequest,
    NewPassword, PasswordRecovery, PollCreate, PollDetail, PollResults, PollUpdate, QuestionCreate, QuestionDetail,
    QuestionResult, QuestionUpdate, RegistrationCompletion, RegistrationLink, StatusChange, SubmissionReceipt,
    SubmitResponses, TokenBody, TokenVerificationResponse, UpdateUserProfile, UserCreate, UserCreateByEmail, UserOut,
    UserUpdate,
};
use axum::Json;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "testdesk", description = "Poll authoring and participation API"),
    components(schemas(
        Role, UserOut, UserCreate, UserUpdate, UpdateUserProfile, UserCreateByEmail, RegistrationLink, TokenBody,
        TokenVerificationResponse, RegistrationCompletion, LoginRequest, AccessToken, AvatarUploaded,
        PasswordRecovery, NewPassword,
        Company, CompanyCreate, CompanyUpdate,
        PollStatus, QuestionType, Poll, Question, Choice, Response, PollCreate, PollUpdate, StatusChange,
        QuestionCreate, QuestionUpdate, ChoiceCreate, Answer, SubmitResponses, SubmissionReceipt,
        QuestionDetail, PollDetail, ChoiceCount, QuestionResult, PollResults, Message
    ))
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
