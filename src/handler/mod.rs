mod responses;

use std::time::SystemTime;

use crate::config::config;
use crate::http::request::HttpRequest;
use crate::http::response::HttpResponse;
use crate::http::status::HttpStatus;

pub fn handle_request(req: &HttpRequest) -> HttpResponse {
    let mut res = route(req);
    finalize(&mut res);
    res
}

pub fn handle_error(status: HttpStatus) -> HttpResponse {
    let mut res = responses::any_error(status);
    finalize(&mut res);
    res
}

fn route(req: &HttpRequest) -> HttpResponse {
    match (req.method(), req.target()) {
        (Some("GET"), Some("/")) => responses::welcome(),
        (Some("POST"), Some("/echo")) => responses::echo(req),
        (Some("GET"), Some(_)) => responses::not_found(),
        _ => responses::any_error(HttpStatus::MethodNotAllowed),
    }
}

// Headers every reply carries, applied after routing.
fn finalize(res: &mut HttpResponse) {
    res.headers.insert("Server", &config().server_name);
    res.headers
        .insert("Date", &httpdate::fmt_http_date(SystemTime::now()));
    res.headers.insert("Connection", "close");
}
