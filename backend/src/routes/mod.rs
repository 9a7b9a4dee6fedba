// Routes module - organizes all HTTP route handlers

pub mod station;
pub mod totals;

use rocket::fairing::AdHoc;
use rocket::http::{Header, Status};
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::Request;

use crate::models::ErrorBody;

/// JSON error body for requests that never reach a handler
#[catch(default)]
pub fn api_error(status: Status, _request: &Request) -> status::Custom<Json<ErrorBody>> {
    let message = match status.code {
        400 | 422 => "Malformed payload".to_string(),
        404 => "Not found".to_string(),
        _ => status.reason_lossy().to_string(),
    };

    status::Custom(status, Json(ErrorBody { error: message }))
}

/// Answers CORS preflight requests for any path
#[options("/<_..>")]
pub fn preflight() -> Status {
    Status::NoContent
}

/// Permissive CORS headers on every response
pub fn cors() -> AdHoc {
    AdHoc::on_response("CORS", |_, response| {
        Box::pin(async move {
            response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
            response.set_header(Header::new(
                "Access-Control-Allow-Methods",
                "GET, POST, OPTIONS",
            ));
            response.set_header(Header::new("Access-Control-Allow-Headers", "Content-Type"));
        })
    })
}
