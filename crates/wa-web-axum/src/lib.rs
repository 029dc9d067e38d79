use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use wa_core::Headers;
use wa_web_generic::{HeaderConverter, ResponseConverter, WebhookProcessor};

pub const WEBHOOK_PATH: &str = "/webhooks/whatsapp";

#[derive(Clone, Debug)]
pub struct AppState {
    pub processor: WebhookProcessor,
}

/// Axum-specific header converter
pub struct AxumHeaderConverter;

impl HeaderConverter for AxumHeaderConverter {
    type HeaderType = HeaderMap;

    fn to_generic_headers(headers: &Self::HeaderType) -> Headers {
        headers
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    v.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect()
    }
}

/// Axum-specific response converter
pub struct AxumResponseConverter;

impl ResponseConverter for AxumResponseConverter {
    type ResponseType = Response;

    fn from_webhook_response(response: wa_core::WebhookResponse) -> Self::ResponseType {
        let status = StatusCode::from_u16(response.status.as_u16())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            [(header::CONTENT_TYPE, response.content_type)],
            response.body,
        )
            .into_response()
    }
}

/// Handler: POST /webhooks/whatsapp
///
/// The body is read up to the processor's limit; anything larger, or a body
/// that cannot be read at all, is answered with the fallback document.
pub async fn whatsapp_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> impl IntoResponse {
    let generic_headers = AxumHeaderConverter::to_generic_headers(&headers);
    let response = match to_bytes(body, state.processor.max_body_size()).await {
        Ok(bytes) => state.processor.process_webhook(generic_headers, &bytes),
        Err(_) => state.processor.reject_oversized(),
    };
    AxumResponseConverter::from_webhook_response(response)
}

/// Router with the webhook mounted at [`WEBHOOK_PATH`].
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(WEBHOOK_PATH, post(whatsapp_webhook))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;
    use wa_core::{GatewayError, MessagingClient, SendRequest, SendResponse};
    use wa_twilio::WhatsAppGateway;

    struct NoopClient;

    #[async_trait]
    impl MessagingClient for NoopClient {
        fn provider(&self) -> &'static str {
            "noop"
        }

        async fn send(&self, _req: SendRequest<'_>) -> Result<SendResponse, GatewayError> {
            Err(GatewayError::Unexpected("not used".into()))
        }
    }

    fn app(max_body_size: usize) -> Router {
        let gateway = WhatsAppGateway::new(Arc::new(NoopClient), "whatsapp:+1");
        let processor =
            WebhookProcessor::new(Arc::new(gateway)).with_max_body_size(max_body_size);
        router(AppState { processor })
    }

    fn form_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(WEBHOOK_PATH)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn webhook_returns_xml() {
        let res = app(1024)
            .oneshot(form_request("From=whatsapp%3A%2B1&Body=hello"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "text/xml");
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("<Message>Received your message: hello</Message>"));
    }

    #[tokio::test]
    async fn oversized_webhook_still_gets_twiml() {
        let res = app(4)
            .oneshot(form_request("Body=hello"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("<Response><Message>Sorry"));
    }
}
