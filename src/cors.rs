use actix_cors::Cors;

const ALLOWED_METHODS: [&str; 5] = ["PATCH", "GET", "POST", "PUT", "DELETE"];

/// CORS policy for the frontend. Without a configured origin any origin is allowed.
pub fn layer(frontend_url: Option<&str>) -> Cors {
    let cors = match frontend_url {
        Some(origin) => Cors::default().allowed_origin(origin),
        None => Cors::default().allow_any_origin(),
    };

    cors.allowed_methods(ALLOWED_METHODS).allow_any_header()
}
