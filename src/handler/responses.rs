use crate::config::config;
use crate::http::request::HttpRequest;
use crate::http::response::HttpResponse;
use crate::http::status::HttpStatus;

pub fn welcome() -> HttpResponse {
    let body = format!("<h1>Welcome to {}!</h1>", config().server_name).into_bytes();
    HttpResponse::with_body(HttpStatus::Ok, "text/html", body)
}

/// Mirrors the request body back, preserving its declared content type.
pub fn echo(req: &HttpRequest) -> HttpResponse {
    let content_type = req
        .headers
        .get("content-type")
        .unwrap_or("application/octet-stream");
    HttpResponse::with_body(HttpStatus::Ok, content_type, req.body.clone())
}

pub fn bad_request() -> HttpResponse {
    HttpResponse::with_body(
        HttpStatus::BadRequest,
        "text/html",
        b"<h1>400 Bad Request</h1>".to_vec(),
    )
}

pub fn not_found() -> HttpResponse {
    HttpResponse::with_body(
        HttpStatus::NotFound,
        "text/html",
        b"<h1>404 Not Found</h1>".to_vec(),
    )
}

pub fn internal_server_error() -> HttpResponse {
    HttpResponse::with_body(
        HttpStatus::InternalServerError,
        "text/html",
        b"<h1>500 Internal Server Error</h1>".to_vec(),
    )
}

pub fn any_error(status: HttpStatus) -> HttpResponse {
    match status {
        HttpStatus::BadRequest => bad_request(),
        HttpStatus::NotFound => not_found(),
        HttpStatus::InternalServerError => internal_server_error(),
        _ => HttpResponse::new(status),
    }
}
