//! Demo handler reporting the request path and negotiated protocol.

use bytes::Bytes;
use futures_util::future::BoxFuture;
use hyper::Request;

use crate::http::handler::{ConnectionInfo, RequestHandler, ResponseSink};

/// Writes `path=<path>,proto=<negotiated protocol>` for every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathEcho;

impl RequestHandler for PathEcho {
    fn serve<'a>(
        &'a self,
        sink: &'a mut dyn ResponseSink,
        request: Request<Bytes>,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let proto = request
                .extensions()
                .get::<ConnectionInfo>()
                .map(|info| info.negotiated_protocol.as_str())
                .unwrap_or("");
            sink.write_str(&format!("path={},proto={}", request.uri().path(), proto));
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::handler::BufferedResponse;

    #[tokio::test]
    async fn reports_path_and_protocol() {
        let mut request = Request::get("/foo").body(Bytes::new()).unwrap();
        request.extensions_mut().insert(ConnectionInfo {
            remote_addr: "127.0.0.1:9".parse().unwrap(),
            negotiated_protocol: "tls-0.9".into(),
        });

        let mut sink = BufferedResponse::new();
        PathEcho.serve(&mut sink, request).await;
        assert_eq!(sink.body(), b"path=/foo,proto=tls-0.9");
    }

    #[tokio::test]
    async fn missing_info_means_empty_protocol() {
        let request = Request::get("/").body(Bytes::new()).unwrap();
        let mut sink = BufferedResponse::new();
        PathEcho.serve(&mut sink, request).await;
        assert_eq!(sink.body(), b"path=/,proto=");
    }
}
