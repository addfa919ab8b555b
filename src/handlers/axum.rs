use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{Request, State},
    http::{HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{MethodFilter, MethodRouter, on},
};

use clubhub_core::{DatabaseAdapter, HttpMethod, HubError, HubRequest, HubResponse};

use crate::Hub;

/// Upper bound on bytes buffered from a request body before the hub's own
/// body-limit middleware sees it.
const MAX_BUFFERED_BODY: usize = 1024 * 1024;

/// Integration trait for the Axum web framework.
pub trait AxumIntegration<DB: DatabaseAdapter> {
    /// Create an Axum router serving `/ok`, `/health` and every plugin route.
    fn axum_router(self) -> Router<Arc<Hub<DB>>>;
}

impl<DB: DatabaseAdapter> AxumIntegration<DB> for Arc<Hub<DB>> {
    fn axum_router(self) -> Router<Arc<Hub<DB>>> {
        let mut paths: BTreeMap<String, Vec<MethodFilter>> = BTreeMap::new();
        paths.entry("/ok".to_string()).or_default().push(MethodFilter::GET);
        paths.entry("/health".to_string()).or_default().push(MethodFilter::GET);

        for (method, path) in self.routes() {
            match method_filter(&method) {
                Some(filter) => paths.entry(path).or_default().push(filter),
                None => tracing::warn!(?method, %path, "Skipping route with unsupported method"),
            }
        }

        // One method router per path; axum rejects a path registered twice
        let mut router = Router::new();
        for (path, filters) in paths {
            let mut methods: Option<MethodRouter<Arc<Hub<DB>>>> = None;
            for filter in filters {
                methods = Some(match methods {
                    Some(m) => m.on(filter, dispatch::<DB>),
                    None => on(filter, dispatch::<DB>),
                });
            }
            if let Some(methods) = methods {
                router = router.route(&path, methods);
            }
        }

        router.with_state(self)
    }
}

fn method_filter(method: &HttpMethod) -> Option<MethodFilter> {
    match method {
        HttpMethod::Get => Some(MethodFilter::GET),
        HttpMethod::Post => Some(MethodFilter::POST),
        HttpMethod::Put => Some(MethodFilter::PUT),
        HttpMethod::Delete => Some(MethodFilter::DELETE),
        HttpMethod::Patch => Some(MethodFilter::PATCH),
        HttpMethod::Options | HttpMethod::Head => None,
    }
}

async fn dispatch<DB: DatabaseAdapter>(State(hub): State<Arc<Hub<DB>>>, req: Request) -> Response {
    match convert_axum_request(req).await {
        Ok(hub_req) => convert_hub_response(hub.handle_request(hub_req).await),
        Err(err) => convert_hub_response(err.into_response()),
    }
}

async fn convert_axum_request(req: Request) -> Result<HubRequest, HubError> {
    let (parts, body) = req.into_parts();

    let method = match parts.method {
        Method::GET => HttpMethod::Get,
        Method::POST => HttpMethod::Post,
        Method::PUT => HttpMethod::Put,
        Method::DELETE => HttpMethod::Delete,
        Method::PATCH => HttpMethod::Patch,
        Method::OPTIONS => HttpMethod::Options,
        Method::HEAD => HttpMethod::Head,
        _ => return Err(HubError::bad_request("Unsupported HTTP method")),
    };

    // HeaderName::as_str is already lowercase
    let mut headers = HashMap::new();
    for (name, value) in parts.headers.iter() {
        if let Ok(value) = value.to_str() {
            headers.insert(name.as_str().to_string(), value.to_string());
        }
    }

    let mut query = HashMap::new();
    if let Some(query_str) = parts.uri.query() {
        for (key, value) in url::form_urlencoded::parse(query_str.as_bytes()) {
            query.insert(key.into_owned(), value.into_owned());
        }
    }

    let bytes = axum::body::to_bytes(body, MAX_BUFFERED_BODY)
        .await
        .map_err(|_| HubError::bad_request("Request body is too large or unreadable"))?;
    let body = (!bytes.is_empty()).then(|| bytes.to_vec());

    Ok(HubRequest::from_parts(
        method,
        parts.uri.path().to_string(),
        headers,
        body,
        query,
    ))
}

fn convert_hub_response(hub_response: HubResponse) -> Response {
    let status =
        StatusCode::from_u16(hub_response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = Response::builder().status(status);

    for (name, value) in hub_response.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            response = response.header(name, value);
        }
    }

    response
        .body(Body::from(hub_response.body))
        .unwrap_or_else(|_| {
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        })
}
