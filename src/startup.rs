use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::PgPool;
use std::net::TcpListener;

use crate::configuration::AuthSettings;
use crate::middleware::AuthMiddleware;
use crate::routes::{
    add_selection, create_quiz, create_quiz_suite, delete_quiz, delete_quiz_suite, delete_user,
    get_current_user, get_quiz, get_quiz_suite, get_quiz_suites, get_user, get_user_quizzes,
    health_check, login, logout, refresh, register, remove_selection, update_quiz,
    update_quiz_suite, update_user,
};

pub fn run(
    listener: TcpListener,
    connection: PgPool,
    auth_config: AuthSettings,
) -> Result<Server, std::io::Error> {
    let connection = web::Data::new(connection);
    let auth_config_data = web::Data::new(auth_config.clone());

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(connection.clone())
            .app_data(auth_config_data.clone())
            .route("/health_check", web::get().to(health_check))
            // Public routes: registration, login, token refresh
            .service(
                web::scope("/api")
                    .route("/users", web::post().to(register))
                    .route("/users/login", web::post().to(login))
                    .route("/users/refresh", web::post().to(refresh))
                    // Everything else requires a valid access token
                    .service(
                        web::scope("")
                            .wrap(AuthMiddleware::new(auth_config.clone()))
                            .route("/users/logout", web::post().to(logout))
                            .route("/users/me", web::get().to(get_current_user))
                            .route("/users/{id}", web::get().to(get_user))
                            .route("/users/{id}", web::put().to(update_user))
                            .route("/users/{id}", web::delete().to(delete_user))
                            .route("/quizzes", web::post().to(create_quiz))
                            .route("/quizzes/user", web::get().to(get_user_quizzes))
                            .route("/quizzes/{id}", web::get().to(get_quiz))
                            .route("/quizzes/{id}", web::put().to(update_quiz))
                            .route("/quizzes/{id}", web::delete().to(delete_quiz))
                            .route("/quizzes/{id}/selections", web::post().to(add_selection))
                            .route(
                                "/quizzes/{id}/selections/{selection_id}",
                                web::delete().to(remove_selection),
                            )
                            .route("/quiz-suites", web::post().to(create_quiz_suite))
                            .route("/quiz-suites", web::get().to(get_quiz_suites))
                            .route("/quiz-suites/{id}", web::get().to(get_quiz_suite))
                            .route("/quiz-suites/{id}", web::put().to(update_quiz_suite))
                            .route("/quiz-suites/{id}", web::delete().to(delete_quiz_suite)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
