use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use std::convert::Infallible;
use std::net::SocketAddr;

pub const HEADER_FORWARDED_FOR: &str = "x-forwarded-for";
pub const HEADER_REAL_IP: &str = "x-real-ip";
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Identity the rate limiter counts requests against: the first forwarded
/// address when behind a proxy, else the peer address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

fn from_headers(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get(HEADER_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = || {
        headers
            .get(HEADER_REAL_IP)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    forwarded.or_else(real_ip).map(str::to_string)
}

impl<S> FromRequestParts<S> for ClientId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = from_headers(&parts.headers)
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());
        Ok(ClientId(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> ClientId {
        let (mut parts, _) = request.into_parts();
        ClientId::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn prefers_first_forwarded_address() {
        let request = Request::builder()
            .header(HEADER_FORWARDED_FOR, "203.0.113.7, 10.0.0.1")
            .header(HEADER_REAL_IP, "198.51.100.2")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await, ClientId("203.0.113.7".into()));
    }

    #[tokio::test]
    async fn falls_back_to_real_ip_then_peer() {
        let request = Request::builder()
            .header(HEADER_REAL_IP, "198.51.100.2")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await, ClientId("198.51.100.2".into()));

        let mut request = Request::builder().body(()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4242))));
        assert_eq!(extract(request).await, ClientId("127.0.0.1".into()));
    }

    #[tokio::test]
    async fn unknown_without_any_source() {
        let request = Request::builder().body(()).unwrap();
        assert_eq!(extract(request).await, ClientId(UNKNOWN_CLIENT.into()));
    }
}
