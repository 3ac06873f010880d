use actix_web::web;

pub mod duels;
pub mod health;
pub mod rounds;

/// Register every route. Middleware is wrapped by the caller.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/health").configure(health::configure_routes));
    cfg.service(web::scope("/api/duels").configure(duels::configure_routes));
    cfg.service(web::scope("/api/rounds").configure(rounds::configure_routes));
}
