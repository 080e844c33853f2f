//! Request and response shapes exchanged with the FileHub API.

pub mod auth;
pub mod dashboard;
pub mod file;
pub mod user;

pub use auth::{
    ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, LoginResponse, RegisterRequest,
    ResetPasswordRequest,
};
pub use dashboard::{DashboardStats, FileTypeCount};
pub use file::{filter_and_sort, FileCategory, FileRecord, SortDirection, SortField};
pub use user::{ProfileUpdate, User, UserPatch};
