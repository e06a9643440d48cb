pub mod app_error;

pub use app_error::{AppError, AppResult, SESSION_NOT_FOUND};
