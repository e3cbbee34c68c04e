use crate::session::config::SessionConfig;
use anyhow::Context;
use rupacore::media::{FrameSource, MediaFile};
use rupacore::{CompareClient, CompareError, CompareWorkflow, SlotId};
use std::path::PathBuf;
use std::sync::Arc;

/// Where a slot's image comes from on the command line.
#[derive(Clone, Debug, PartialEq)]
pub enum SlotSource {
    File(PathBuf),
    Camera,
}

impl SlotSource {
    pub fn from_flags(path: Option<PathBuf>, capture: bool) -> Option<Self> {
        match (path, capture) {
            (_, true) => Some(SlotSource::Camera),
            (Some(path), false) => Some(SlotSource::File(path)),
            (None, false) => None,
        }
    }
}

/// Drives one comparison from start to finish, the way the compare page
/// would: fill slots, submit, leave the outcome in the workflow state.
#[derive(Clone)]
pub struct Runner {
    config: SessionConfig,
    client: Arc<dyn CompareClient>,
    camera: Arc<dyn FrameSource>,
}

impl Runner {
    pub fn new(
        config: SessionConfig,
        client: Arc<dyn CompareClient>,
        camera: Arc<dyn FrameSource>,
    ) -> Self {
        Self {
            config,
            client,
            camera,
        }
    }

    pub async fn execute(
        &self,
        first: Option<SlotSource>,
        second: Option<SlotSource>,
    ) -> anyhow::Result<CompareWorkflow> {
        let mut workflow = CompareWorkflow::new(self.config.model);

        for (slot, source) in [(SlotId::First, first), (SlotId::Second, second)] {
            if let Some(source) = source {
                self.fill(&mut workflow, slot, source).await?;
            }
        }

        // The outcome, including MissingInput, is recorded in the workflow state.
        if let Err(err) = workflow.submit(self.client.as_ref()).await {
            log::debug!("comparison ended with: {}", err);
        }
        Ok(workflow)
    }

    async fn fill(
        &self,
        workflow: &mut CompareWorkflow,
        slot: SlotId,
        source: SlotSource,
    ) -> anyhow::Result<()> {
        let outcome = match source {
            SlotSource::File(path) => {
                let media = MediaFile::read(&path)
                    .with_context(|| format!("reading {} from {}", slot, path.display()))?;
                workflow.select_file(slot, media)
            }
            SlotSource::Camera => {
                let frame = self
                    .camera
                    .capture()
                    .await
                    .with_context(|| format!("capturing {} from the camera", slot))?;
                workflow.accept_capture(slot, frame)
            }
        };

        if let Err(err @ CompareError::InvalidMediaType { .. }) = &outcome {
            log::warn!("{}: {:?}", slot, err);
            eprintln!("{}: {}", slot, err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::{StubBackend, StubReply};
    use async_trait::async_trait;
    use rupacore::media::{CaptureError, CapturedFrame};
    use rupacore::service::{HttpCompareClient, VerificationPolicy};
    use rupacore::{ResultView, Settings, WorkflowState};
    use std::io::Write;
    use std::net::SocketAddr;
    use tempfile::NamedTempFile;

    /// Always hands back the same JPEG, or fails when empty.
    struct FixedCamera(Vec<u8>);

    #[async_trait]
    impl FrameSource for FixedCamera {
        async fn capture(&self) -> Result<CapturedFrame, CaptureError> {
            if self.0.is_empty() {
                Err(CaptureError::EmptyFrame)
            } else {
                Ok(CapturedFrame {
                    jpeg: self.0.clone(),
                })
            }
        }
    }

    fn jpeg_file() -> NamedTempFile {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]).unwrap();
        temp
    }

    async fn runner_against(reply: StubReply) -> (Runner, StubBackend) {
        let (backend, server) =
            StubBackend::bind(SocketAddr::from(([127, 0, 0, 1], 0)), reply).unwrap();
        tokio::spawn(server);

        let config = SessionConfig::from_args(
            Settings::default(),
            None,
            Some(backend.compare_url()),
            None,
        );
        let client = HttpCompareClient::new(&config.settings.service, config.policy).unwrap();
        let runner = Runner::new(
            config,
            Arc::new(client),
            Arc::new(FixedCamera(vec![0xFF, 0xD8, 0xFF])),
        );
        (runner, backend)
    }

    #[tokio::test]
    async fn two_images_produce_one_request_and_a_result() {
        let (runner, backend) = runner_against(StubReply::Match { distance: 0.23 }).await;
        let (a, b) = (jpeg_file(), jpeg_file());

        let workflow = runner
            .execute(
                Some(SlotSource::File(a.path().to_path_buf())),
                Some(SlotSource::File(b.path().to_path_buf())),
            )
            .await
            .unwrap();

        assert_eq!(backend.requests(), 1);
        let form = backend.last_form().expect("stub recorded the form");
        let mut names: Vec<&str> = form.keys().map(String::as_str).collect();
        names.sort_unstable();
        assert_eq!(names, ["img1", "img2", "model_name"]);
        for (field, path) in [("img1", a.path()), ("img2", b.path())] {
            let part = &form[field];
            let expected_name = path.file_name().and_then(|name| name.to_str());
            assert_eq!(part.file_name.as_deref(), expected_name);
            assert_eq!(part.content_type.as_deref(), Some("image/jpeg"));
            assert_eq!(part.data, [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]);
        }
        assert_eq!(form["model_name"].data, b"Facenet512");
        assert_eq!(form["model_name"].file_name, None);

        let result = workflow.state().result().expect("comparison succeeded");
        assert_eq!(result.model_used, "Facenet512");
        assert_eq!(result.similarity, 77.0);
        assert!(result.verified);
    }

    #[tokio::test]
    async fn missing_second_image_sends_nothing() {
        let (runner, backend) = runner_against(StubReply::default()).await;
        let a = jpeg_file();

        let workflow = runner
            .execute(Some(SlotSource::File(a.path().to_path_buf())), None)
            .await
            .unwrap();

        assert_eq!(backend.requests(), 0);
        assert_eq!(
            ResultView::of(workflow.state()),
            ResultView::Failure("Please provide both images.".into())
        );
    }

    #[tokio::test]
    async fn server_failure_is_reported_verbatim() {
        let (runner, _backend) = runner_against(StubReply::Fail {
            status: 500,
            message: "model load failed".into(),
        })
        .await;
        let (a, b) = (jpeg_file(), jpeg_file());

        let workflow = runner
            .execute(
                Some(SlotSource::File(a.path().to_path_buf())),
                Some(SlotSource::File(b.path().to_path_buf())),
            )
            .await
            .unwrap();

        assert_eq!(
            workflow.state(),
            &WorkflowState::Failed(CompareError::Server("model load failed".into()))
        );
    }

    #[tokio::test]
    async fn camera_slot_is_treated_like_an_upload() {
        let (runner, backend) = runner_against(StubReply::default()).await;
        let b = jpeg_file();

        let workflow = runner
            .execute(
                Some(SlotSource::Camera),
                Some(SlotSource::File(b.path().to_path_buf())),
            )
            .await
            .unwrap();

        assert_eq!(backend.requests(), 1);
        let first = workflow.slot(SlotId::First).unwrap();
        assert_eq!(first.media().file_name(), "First Image.jpg");
        assert!(workflow.state().result().is_some());
    }

    #[tokio::test]
    async fn threshold_policy_overrides_server_verdict() {
        let (backend, server) = StubBackend::bind(
            SocketAddr::from(([127, 0, 0, 1], 0)),
            StubReply::Match { distance: 0.38 },
        )
        .unwrap();
        tokio::spawn(server);
        let config = SessionConfig::from_args(
            Settings::default(),
            None,
            Some(backend.compare_url()),
            Some(65.0),
        );
        assert_eq!(config.policy, VerificationPolicy::Threshold { percent: 65.0 });
        let client = HttpCompareClient::new(&config.settings.service, config.policy).unwrap();
        let runner = Runner::new(config, Arc::new(client), Arc::new(FixedCamera(Vec::new())));
        let (a, b) = (jpeg_file(), jpeg_file());

        let workflow = runner
            .execute(
                Some(SlotSource::File(a.path().to_path_buf())),
                Some(SlotSource::File(b.path().to_path_buf())),
            )
            .await
            .unwrap();

        // 62% similarity: the stub says verified, the client threshold does not.
        let result = workflow.state().result().unwrap();
        assert_eq!(result.similarity, 62.0);
        assert!(!result.verified);
    }

    #[tokio::test]
    async fn non_image_file_leaves_slot_empty() {
        let (runner, backend) = runner_against(StubReply::default()).await;
        let mut text = NamedTempFile::new().unwrap();
        text.write_all(b"just some notes").unwrap();
        let b = jpeg_file();

        let workflow = runner
            .execute(
                Some(SlotSource::File(text.path().to_path_buf())),
                Some(SlotSource::File(b.path().to_path_buf())),
            )
            .await
            .unwrap();

        assert!(workflow.slot(SlotId::First).is_none());
        assert_eq!(backend.requests(), 0);
    }

    #[tokio::test]
    async fn camera_failure_aborts_the_run() {
        let (backend, server) =
            StubBackend::bind(SocketAddr::from(([127, 0, 0, 1], 0)), StubReply::default())
                .unwrap();
        tokio::spawn(server);
        let config = SessionConfig::from_args(
            Settings::default(),
            None,
            Some(backend.compare_url()),
            None,
        );
        let client = HttpCompareClient::new(&config.settings.service, config.policy).unwrap();
        let runner = Runner::new(config, Arc::new(client), Arc::new(FixedCamera(Vec::new())));
        let b = jpeg_file();

        let err = runner
            .execute(
                Some(SlotSource::Camera),
                Some(SlotSource::File(b.path().to_path_buf())),
            )
            .await
            .unwrap_err();

        assert!(err.to_string().contains("capturing First Image from the camera"));
        assert!(err
            .chain()
            .any(|cause| cause.to_string() == "camera produced an empty frame"));
        assert_eq!(backend.requests(), 0);
    }

    #[test]
    fn capture_flag_wins_over_path() {
        assert_eq!(
            SlotSource::from_flags(Some("a.jpg".into()), true),
            Some(SlotSource::Camera)
        );
        assert_eq!(SlotSource::from_flags(None, false), None);
    }
}
