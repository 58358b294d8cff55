use axum::body::to_bytes;
use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

/// Форматирует число с разделителями тысяч (точками)
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push('.');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Middleware для логирования HTTP запросов: method, path, status,
/// response size and duration of every request.
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;
    let (parts, body) = response.into_parts();

    // The body is buffered to report its real size
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(
                "{} {} -> {} | {}ms | body error: {}",
                method,
                path,
                parts.status.as_u16(),
                start.elapsed().as_millis(),
                e
            );
            return Response::from_parts(parts, Body::default());
        }
    };

    let status = parts.status.as_u16();
    let elapsed = start.elapsed().as_millis();
    if parts.status.is_success() {
        tracing::info!(
            "{} {} -> {} | {}ms | {} bytes",
            method,
            path,
            status,
            elapsed,
            format_number(bytes.len())
        );
    } else {
        tracing::warn!(
            "{} {} -> {} | {}ms | {} bytes",
            method,
            path,
            status,
            elapsed,
            format_number(bytes.len())
        );
    }

    Response::from_parts(parts, Body::from(bytes))
}
