use log::{debug, error};
use serde_json::Value;
use std::collections::HashMap;
use std::convert::Infallible;
use warp::filters::body::BodyDeserializeError;
use warp::http::StatusCode;
use warp::reject::{MethodNotAllowed, PayloadTooLarge};
use warp::{reply, Filter, Rejection, Reply};

use super::types::{ApiError, DeleteConfirmation};
use crate::error_handling::types::ServiceError;
use crate::interfaces::service::InterfaceService;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: u64 = 64 * 1024;

fn json_body() -> impl Filter<Extract = (Value,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

fn query_params() -> impl Filter<Extract = (HashMap<String, String>,), Error = Rejection> + Clone
{
    warp::query::<HashMap<String, String>>()
}

fn json_reply<T: serde::Serialize>(body: &T, status: StatusCode) -> reply::Response {
    reply::with_status(reply::json(body), status).into_response()
}

/// Maps a service outcome onto the HTTP taxonomy. Storage failures are
/// logged here and never leak to the caller.
pub fn error_reply(err: ServiceError) -> reply::Response {
    match err {
        ServiceError::NotFound => json_reply(
            &ApiError::new(ServiceError::NotFound.to_string()),
            StatusCode::NOT_FOUND,
        ),
        ServiceError::Validation(e) => json_reply(
            &ApiError::with_detail("Invalid request", e.to_string()),
            StatusCode::BAD_REQUEST,
        ),
        ServiceError::Storage(e) => {
            error!("Request failed: {}", e);
            json_reply(
                &ApiError::new("Internal server error"),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}

fn respond<T: serde::Serialize>(
    result: Result<T, ServiceError>,
    status: StatusCode,
) -> Result<reply::Response, Rejection> {
    Ok(match result {
        Ok(body) => json_reply(&body, status),
        Err(e) => error_reply(e),
    })
}

/// GET /
pub fn dashboard_route() -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path::end().and(warp::get()).map(|| {
        reply::html(
            r#"<html><head><title>Interface Monitor</title></head>
<body><h1>Interface Monitor is running</h1>
<ul>
<li>GET /api/interfaces</li>
<li>GET /api/interfaces/summary?timeRange=24h</li>
<li>GET|PUT|DELETE /api/interfaces/:id</li>
<li>POST /api/interfaces</li>
</ul></body></html>"#,
        )
    })
}

/// GET /api/interfaces
pub fn list_interfaces_route(
    service: InterfaceService,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("api" / "interfaces")
        .and(warp::get())
        .and(query_params())
        .and_then(move |params: HashMap<String, String>| {
            let service = service.clone();
            async move { respond(service.list(&params).await, StatusCode::OK) }
        })
}

/// GET /api/interfaces/summary
pub fn summary_route(
    service: InterfaceService,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("api" / "interfaces" / "summary")
        .and(warp::get())
        .and(query_params())
        .and_then(move |params: HashMap<String, String>| {
            let service = service.clone();
            async move {
                let range = params.get("timeRange").map(String::as_str);
                respond(service.summary(range).await, StatusCode::OK)
            }
        })
}

/// GET /api/interfaces/:id
pub fn get_interface_route(
    service: InterfaceService,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("api" / "interfaces" / String)
        .and(warp::get())
        .and_then(move |id: String| {
            let service = service.clone();
            async move { respond(service.get(&id).await, StatusCode::OK) }
        })
}

/// POST /api/interfaces
pub fn create_interface_route(
    service: InterfaceService,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("api" / "interfaces")
        .and(warp::post())
        .and(json_body())
        .and_then(move |body: Value| {
            let service = service.clone();
            async move { respond(service.create(body).await, StatusCode::CREATED) }
        })
}

/// PUT /api/interfaces/:id
pub fn update_interface_route(
    service: InterfaceService,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("api" / "interfaces" / String)
        .and(warp::put())
        .and(json_body())
        .and_then(move |id: String, body: Value| {
            let service = service.clone();
            async move { respond(service.update(&id, body).await, StatusCode::OK) }
        })
}

/// DELETE /api/interfaces/:id
pub fn delete_interface_route(
    service: InterfaceService,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("api" / "interfaces" / String)
        .and(warp::delete())
        .and_then(move |id: String| {
            let service = service.clone();
            async move {
                let result = service.delete(&id).await.map(|()| DeleteConfirmation {
                    message: "Interface deleted successfully".to_string(),
                });
                respond(result, StatusCode::OK)
            }
        })
}

/// Every route, with rejections turned into JSON errors. `summary` must be
/// tried before the `:id` routes.
pub fn api_routes(
    service: InterfaceService,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    dashboard_route()
        .or(summary_route(service.clone()))
        .or(list_interfaces_route(service.clone()))
        .or(create_interface_route(service.clone()))
        .or(get_interface_route(service.clone()))
        .or(update_interface_route(service.clone()))
        .or(delete_interface_route(service))
        .recover(handle_rejection)
}

/// Converts unmatched routes and malformed requests into `{message}` JSON.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, body) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, ApiError::new("Route not found"))
    } else if let Some(e) = err.find::<BodyDeserializeError>() {
        (
            StatusCode::BAD_REQUEST,
            ApiError::with_detail("Invalid JSON body", e.to_string()),
        )
    } else if err.find::<PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::new("Request body too large"),
        )
    } else if err.find::<MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            ApiError::new("Method not allowed"),
        )
    } else {
        debug!("Unhandled rejection: {:?}", err);
        (StatusCode::BAD_REQUEST, ApiError::new("Bad request"))
    };
    Ok(reply::with_status(reply::json(&body), status))
}
