mod auth;
mod health_check;
mod quiz_suites;
mod quizzes;
mod users;

pub use auth::{get_current_user, login, logout, refresh, register};
pub use health_check::health_check;
pub use quiz_suites::{
    create_quiz_suite, delete_quiz_suite, get_quiz_suite, get_quiz_suites, update_quiz_suite,
};
pub use quizzes::{
    add_selection, create_quiz, delete_quiz, get_quiz, get_user_quizzes, remove_selection,
    update_quiz,
};
pub use users::{delete_user, get_user, update_user};
