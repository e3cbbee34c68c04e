use crate::stub::script::{similarity_for, StubReply, STUB_MATCH_DISTANCE};
use anyhow::Context;
use futures::TryStreamExt;
use serde_json::json;
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use warp::http::StatusCode;
use warp::multipart::FormData;
use warp::reply::Response;
use warp::{Buf, Filter, Reply};

const MAX_UPLOAD_BYTES: u64 = 32 * 1024 * 1024;
const FALLBACK_MODEL: &str = "VGG-Face";

/// One multipart field as the stub received it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedPart {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

type Received = Arc<Mutex<Option<HashMap<String, ReceivedPart>>>>;

/// Local stand-in for the comparison service. It speaks the same multipart
/// contract and replays a scripted reply instead of analysing faces.
pub struct StubBackend {
    addr: SocketAddr,
    requests: Arc<AtomicUsize>,
    last_form: Received,
}

impl StubBackend {
    /// Binds `addr` (port 0 picks a free port). The returned future serves
    /// requests and must be spawned by the caller.
    pub fn bind(
        addr: SocketAddr,
        reply: StubReply,
    ) -> anyhow::Result<(Self, impl Future<Output = ()> + Send + 'static)> {
        let requests = Arc::new(AtomicUsize::new(0));
        let reply = Arc::new(reply);
        let last_form: Received = Arc::new(Mutex::new(None));
        let counter = requests.clone();
        let recorder = last_form.clone();
        let reply_filter = warp::any().map(move || reply.clone());
        let counter_filter = warp::any().map(move || counter.clone());
        let recorder_filter = warp::any().map(move || recorder.clone());

        let compare_route = warp::path("compare")
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::multipart::form().max_length(MAX_UPLOAD_BYTES))
            .and(reply_filter)
            .and(counter_filter)
            .and(recorder_filter)
            .then(
                |form: FormData,
                 reply: Arc<StubReply>,
                 counter: Arc<AtomicUsize>,
                 recorder: Received| async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    answer(form, &reply, &recorder).await
                },
            );

        let (bound, server) = warp::serve(compare_route)
            .try_bind_ephemeral(addr)
            .with_context(|| format!("binding stub backend to {}", addr))?;
        log::info!("stub backend bound to {}", bound);

        Ok((
            Self {
                addr: bound,
                requests,
                last_form,
            },
            server,
        ))
    }

    pub fn compare_url(&self) -> String {
        format!("http://{}/compare", self.addr)
    }

    /// Requests that reached the compare route.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Fields of the most recent well-formed multipart request, by name.
    pub fn last_form(&self) -> Option<HashMap<String, ReceivedPart>> {
        self.last_form.lock().ok().and_then(|form| form.clone())
    }
}

async fn answer(form: FormData, reply: &StubReply, recorder: &Received) -> Response {
    let fields = match collect_fields(form).await {
        Ok(fields) => fields,
        Err(err) => {
            log::warn!("stub backend could not read form: {}", err);
            return error_reply(StatusCode::BAD_REQUEST, "Malformed multipart body");
        }
    };

    if let Ok(mut last) = recorder.lock() {
        *last = Some(fields.clone());
    }

    if !fields.contains_key("img1") || !fields.contains_key("img2") {
        return error_reply(StatusCode::BAD_REQUEST, "Please provide both img1 and img2");
    }

    match reply {
        StubReply::Match { distance } => {
            let model = fields
                .get("model_name")
                .and_then(|part| std::str::from_utf8(&part.data).ok())
                .filter(|name| !name.is_empty())
                .unwrap_or(FALLBACK_MODEL);
            for field in ["img1", "img2"] {
                let part = &fields[field];
                log::info!(
                    "stub {}: {} ({}, {} bytes)",
                    field,
                    part.file_name.as_deref().unwrap_or("<unnamed>"),
                    part.content_type.as_deref().unwrap_or("<untyped>"),
                    part.data.len()
                );
            }
            log::info!("stub compare with model {}", model);
            warp::reply::with_status(
                warp::reply::json(&json!({
                    "distance": distance,
                    "similarity": similarity_for(*distance),
                    "model_used": model,
                    "verified": *distance < STUB_MATCH_DISTANCE,
                })),
                StatusCode::OK,
            )
            .into_response()
        }
        StubReply::Fail { status, message } => {
            let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            error_reply(status, message)
        }
    }
}

async fn collect_fields(form: FormData) -> Result<HashMap<String, ReceivedPart>, warp::Error> {
    let parts: Vec<warp::multipart::Part> = form.try_collect().await?;
    let mut fields = HashMap::new();
    for part in parts {
        let name = part.name().to_string();
        let file_name = part.filename().map(str::to_string);
        let content_type = part.content_type().map(str::to_string);
        let data = part
            .stream()
            .try_fold(Vec::new(), |mut acc, buf| async move {
                acc.extend_from_slice(buf.chunk());
                Ok(acc)
            })
            .await?;
        fields.insert(
            name,
            ReceivedPart {
                file_name,
                content_type,
                data,
            },
        );
    }
    Ok(fields)
}

fn error_reply(status: StatusCode, message: &str) -> Response {
    warp::reply::with_status(warp::reply::json(&json!({ "error": message })), status)
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn spawn(reply: StubReply) -> StubBackend {
        let (backend, server) = StubBackend::bind(SocketAddr::from(([127, 0, 0, 1], 0)), reply)
            .unwrap();
        tokio::spawn(server);
        backend
    }

    #[tokio::test]
    async fn missing_image_field_is_rejected() {
        let backend = spawn(StubReply::default()).await;
        let form = reqwest::multipart::Form::new()
            .part("img1", reqwest::multipart::Part::bytes(vec![0xFF, 0xD8, 0xFF]));

        let response = reqwest::Client::new()
            .post(backend.compare_url())
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 400);
        let body = response.text().await.unwrap();
        assert!(body.contains("Please provide both img1 and img2"));
        assert_eq!(backend.requests(), 1);
    }

    #[tokio::test]
    async fn match_reply_echoes_model() {
        let backend = spawn(StubReply::Match { distance: 0.3 }).await;
        let form = reqwest::multipart::Form::new()
            .part("img1", reqwest::multipart::Part::bytes(vec![1]))
            .part("img2", reqwest::multipart::Part::bytes(vec![2]))
            .text("model_name", "ArcFace");

        let response = reqwest::Client::new()
            .post(backend.compare_url())
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert!(response.status().is_success());
        let body: serde_json::Value =
            serde_json::from_str(&response.text().await.unwrap()).unwrap();
        assert_eq!(body["model_used"], "ArcFace");
        assert_eq!(body["similarity"], 70.0);
        assert_eq!(body["verified"], true);
    }
}
