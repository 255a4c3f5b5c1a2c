use axum::{
    extract::Request,
    http::header::{self, HeaderValue},
    middleware::Next,
    response::Response,
};

/// Path prefixes whose responses are user-uploaded content.
pub const UPLOADED_CONTENT_PREFIXES: [&str; 2] = ["/files/", "/files_dev/"];

pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let serves_uploaded_content = UPLOADED_CONTENT_PREFIXES
        .iter()
        .any(|prefix| req.uri().path().starts_with(prefix));

    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));

    // Uploads are unrestricted, so anything served back runs in a sandbox
    // without script or plugin execution.
    if serves_uploaded_content {
        headers.insert(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("sandbox; default-src 'none'; img-src 'self'; media-src 'self'; style-src 'unsafe-inline'"),
        );
    } else {
        headers.insert(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
        );
    }

    response
}
