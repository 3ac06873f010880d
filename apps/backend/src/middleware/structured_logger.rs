use std::future::{ready, Ready};
use std::time::Instant;

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::StatusCode;
use actix_web::{Error as ActixError, HttpMessage};
use futures_util::future::LocalBoxFuture;
use tracing::{error, info, warn};

/// Access log: one `request_completed` event per request, at `error` for
/// 5xx, `warn` for 4xx and `info` otherwise. Duel routes also log `duel_id`.
pub struct StructuredLogger;

impl<S, B> Transform<S, ServiceRequest> for StructuredLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type InitError = ();
    type Transform = StructuredLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(StructuredLoggerMiddleware { service }))
    }
}

pub struct StructuredLoggerMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for StructuredLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let started = Instant::now();
        let method = req.method().clone();
        // Route pattern keeps ids out of the path field.
        let route = req.match_pattern().unwrap_or_else(|| req.path().to_owned());
        let trace_id = req.extensions().get::<String>().cloned().unwrap_or_default();

        let fut = self.service.call(req);

        Box::pin(async move {
            let result = fut.await;
            let (status, duel_id) = match &result {
                Ok(res) => (
                    res.status(),
                    res.request().match_info().get("duel_id").map(str::to_owned),
                ),
                Err(err) => (err.as_response_error().status_code(), None),
            };
            let access = AccessLog {
                method: method.as_str(),
                route: &route,
                status: status.as_u16(),
                duration_us: u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
                duel_id: duel_id.as_deref(),
                trace_id: &trace_id,
            };
            access.emit(status);

            result
        })
    }
}

struct AccessLog<'a> {
    method: &'a str,
    route: &'a str,
    status: u16,
    duration_us: u64,
    duel_id: Option<&'a str>,
    trace_id: &'a str,
}

impl AccessLog<'_> {
    fn emit(&self, status: StatusCode) {
        macro_rules! log_at {
            ($level:ident) => {
                $level!(
                    http.method = self.method,
                    http.route = self.route,
                    http.status_code = self.status,
                    duration_us = self.duration_us,
                    duel_id = self.duel_id,
                    trace_id = self.trace_id,
                    "request_completed"
                )
            };
        }

        if status.is_server_error() {
            log_at!(error);
        } else if status.is_client_error() {
            log_at!(warn);
        } else {
            log_at!(info);
        }
    }
}
