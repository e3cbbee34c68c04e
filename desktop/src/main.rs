use iced::{
    event,
    widget::{
        button, column, image, mouse_area, pick_list, row, scrollable, text, Column, Container,
    },
    window, Alignment, Color, Element, Event, Length, Subscription, Task, Theme,
};
use rfd::AsyncFileDialog;
use rupacore::media::{CapturedFrame, CommandCamera, FrameSource, MediaFile};
use rupacore::service::{CompareClient, ComparisonResult, EmbeddingModel, HttpCompareClient};
use rupacore::{
    AcquisitionMode, CompareError, CompareResult, CompareWorkflow, ResultView, Settings, SlotId,
};
use rupacore::workflow::Ticket;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod header;

const PREVIEW_SIZE: f32 = 240.0;
const HIGH_TONE: Color = Color::from_rgb(0.2, 0.75, 0.4);
const LOW_TONE: Color = Color::from_rgb(0.9, 0.35, 0.3);

fn main() -> iced::Result {
    env_logger::init();
    iced::application(Compare::boot, Compare::update, Compare::view)
        .title(application_title)
        .subscription(application_subscription)
        .theme(application_theme)
        .run()
}

fn application_title(_: &Compare) -> String {
    format!("{} - Compare Faces", header::BRAND)
}

fn application_subscription(_: &Compare) -> Subscription<Message> {
    event::listen_with(|event, _status, _window| match event {
        Event::Window(window::Event::FileDropped(path)) => Some(Message::FileDropped(path)),
        _ => None,
    })
}

fn application_theme(_: &Compare) -> Theme {
    Theme::Dark
}

struct Compare {
    workflow: CompareWorkflow,
    client: Result<Arc<HttpCompareClient>, String>,
    camera: Arc<CommandCamera>,
    previews: HashMap<u64, image::Handle>,
    drop_target: Option<SlotId>,
    warning: Option<String>,
}

#[derive(Debug, Clone)]
enum Message {
    SetMode(SlotId, AcquisitionMode),
    PickFile(SlotId),
    FilePicked(SlotId, Option<PathBuf>),
    FileDropped(PathBuf),
    HoverSlot(SlotId),
    Capture(SlotId),
    Captured(SlotId, Result<CapturedFrame, String>),
    ModelSelected(EmbeddingModel),
    Submit,
    Compared(Ticket, CompareResult<ComparisonResult>),
}

impl Compare {
    fn boot() -> (Self, Task<Message>) {
        let config_path = std::env::args().nth(1).map(PathBuf::from);
        let mut warning = None;
        let settings = match Settings::load_or_default(config_path.as_deref()) {
            Ok(settings) => settings,
            Err(err) => {
                log::error!("{}", err);
                warning = Some(format!("Using default settings: {}", err));
                Settings::default()
            }
        };

        let policy = settings.verification.to_policy();
        let client = HttpCompareClient::new(&settings.service, policy)
            .map(Arc::new)
            .map_err(|err| {
                log::error!("could not build comparison client: {}", err);
                err.to_string()
            });

        (
            Compare {
                workflow: CompareWorkflow::new(settings.default_model),
                client,
                camera: Arc::new(settings.camera),
                previews: HashMap::new(),
                drop_target: None,
                warning,
            },
            Task::none(),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::SetMode(slot, mode) => {
                state.workflow.set_mode(slot, mode);
                Task::none()
            }
            Message::PickFile(slot) => Task::perform(
                async {
                    AsyncFileDialog::new()
                        .add_filter("Images", &["png", "jpg", "jpeg", "bmp", "gif", "webp"])
                        .pick_file()
                        .await
                        .map(|handle| handle.path().to_path_buf())
                },
                move |path| Message::FilePicked(slot, path),
            ),
            Message::FilePicked(slot, Some(path)) => {
                state.load_path(slot, &path);
                Task::none()
            }
            Message::FilePicked(_, None) => Task::none(),
            Message::FileDropped(path) => {
                let slot = state.drop_slot();
                state.load_path(slot, &path);
                Task::none()
            }
            Message::HoverSlot(slot) => {
                state.drop_target = Some(slot);
                Task::none()
            }
            Message::Capture(slot) => {
                let camera = state.camera.clone();
                Task::perform(
                    async move { camera.capture().await.map_err(|err| err.to_string()) },
                    move |frame| Message::Captured(slot, frame),
                )
            }
            Message::Captured(slot, Ok(frame)) => {
                let outcome = state.workflow.accept_capture(slot, frame);
                state.settle(outcome);
                Task::none()
            }
            Message::Captured(slot, Err(err)) => {
                log::warn!("{}: camera capture failed: {}", slot, err);
                state.warning = Some(format!("Camera unavailable: {}", err));
                Task::none()
            }
            Message::ModelSelected(model) => {
                state.workflow.set_model(model);
                Task::none()
            }
            Message::Submit => {
                state.warning = None;
                let submission = match state.workflow.begin_submission() {
                    Ok(submission) => submission,
                    // MissingInput is already shown through the workflow state.
                    Err(err) => {
                        log::debug!("submit refused: {}", err);
                        return Task::none();
                    }
                };
                let ticket = submission.ticket;
                match &state.client {
                    Ok(client) => {
                        let client = client.clone();
                        Task::perform(
                            async move { client.compare(submission.request).await },
                            move |outcome| Message::Compared(ticket, outcome),
                        )
                    }
                    Err(err) => {
                        state.warning = Some(format!("Comparison client unavailable: {}", err));
                        state
                            .workflow
                            .finish(ticket, Err(CompareError::Network(err.clone())));
                        Task::none()
                    }
                }
            }
            Message::Compared(ticket, outcome) => {
                if !state.workflow.finish(ticket, outcome) {
                    log::debug!("dropped a superseded comparison result");
                }
                Task::none()
            }
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let slots = SlotId::ALL
            .iter()
            .fold(row![].spacing(20), |row, slot| row.push(state.slot_panel(*slot)));

        let busy = state.workflow.state().is_submitting();
        let submit_label = if busy { "Analyzing..." } else { "Compare Faces" };
        let controls = row![
            text("Model").size(16),
            pick_list(
                EmbeddingModel::ALL,
                Some(state.workflow.model()),
                Message::ModelSelected
            ),
            button(submit_label)
                .on_press_maybe((!busy).then_some(Message::Submit))
                .padding(10),
        ]
        .spacing(12)
        .align_y(Alignment::Center);

        let warning = text(state.warning.clone().unwrap_or_default())
            .size(14)
            .color(LOW_TONE);

        let history_list = if state.workflow.activity().is_empty() {
            Column::new().push(text("No activity yet").size(12))
        } else {
            state
                .workflow
                .activity()
                .entries()
                .rev()
                .fold(Column::new().spacing(4), |col, entry| {
                    col.push(text(entry.to_string()).size(12))
                })
        };

        let page = column![
            slots,
            controls,
            warning,
            result_panel(&ResultView::of(state.workflow.state())),
            text("Activity log").size(16),
            Container::new(scrollable(history_list).height(Length::Fixed(90.0))).padding(6),
        ]
        .spacing(16)
        .padding(20);

        Container::new(column![header::view("Compare"), page])
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn slot_panel(&self, slot: SlotId) -> Element<'_, Message> {
        let mode = self.workflow.mode(slot);
        let toggle = row![
            mode_button("Upload", slot, AcquisitionMode::Upload, mode),
            mode_button("Camera", slot, AcquisitionMode::Camera, mode),
        ]
        .spacing(6);

        let action: Element<'_, Message> = match mode {
            AcquisitionMode::Upload => column![
                button("Choose file").on_press(Message::PickFile(slot)),
                text("or drop an image here").size(12),
            ]
            .spacing(4)
            .into(),
            AcquisitionMode::Camera => button("Take snapshot")
                .on_press(Message::Capture(slot))
                .into(),
        };

        let preview: Element<'_, Message> = match self
            .workflow
            .slot(slot)
            .and_then(|image_slot| self.previews.get(&image_slot.preview().id()))
        {
            Some(handle) => image(handle.clone())
                .width(Length::Fixed(PREVIEW_SIZE))
                .height(Length::Fixed(PREVIEW_SIZE))
                .into(),
            None => Container::new(text("No image").size(14))
                .width(Length::Fixed(PREVIEW_SIZE))
                .height(Length::Fixed(PREVIEW_SIZE))
                .center_x(Length::Fixed(PREVIEW_SIZE))
                .center_y(Length::Fixed(PREVIEW_SIZE))
                .into(),
        };

        let caption = match self.workflow.slot(slot) {
            Some(image_slot) => format!(
                "{} ({} via {})",
                image_slot.media().file_name(),
                image_slot.media().len(),
                image_slot.acquired_by()
            ),
            None => String::new(),
        };

        let panel = column![
            text(slot.label()).size(20),
            toggle,
            action,
            preview,
            text(caption).size(12),
        ]
        .spacing(8)
        .padding(12)
        .width(Length::FillPortion(1));

        mouse_area(panel).on_enter(Message::HoverSlot(slot)).into()
    }

    fn load_path(&mut self, slot: SlotId, path: &Path) {
        match MediaFile::read(path) {
            Ok(media) => {
                let outcome = self.workflow.select_file(slot, media);
                self.settle(outcome);
            }
            Err(err) => {
                log::warn!("could not read {}: {}", path.display(), err);
                self.warning = Some(format!("Could not read {}", path.display()));
            }
        }
    }

    /// Applies the outcome of populating a slot and refreshes previews.
    fn settle(&mut self, outcome: CompareResult<()>) {
        match outcome {
            Ok(()) => self.warning = None,
            Err(err @ CompareError::InvalidMediaType { .. }) => {
                log::warn!("{:?}", err);
                self.warning = Some(err.to_string());
            }
            Err(err) => self.warning = Some(err.to_string()),
        }
        self.sync_previews();
    }

    fn sync_previews(&mut self) {
        let mut live = HashMap::new();
        for slot in SlotId::ALL {
            if let Some(image_slot) = self.workflow.slot(slot) {
                let preview = image_slot.preview();
                let handle = self
                    .previews
                    .remove(&preview.id())
                    .unwrap_or_else(|| image::Handle::from_bytes(preview.bytes().to_vec()));
                live.insert(preview.id(), handle);
            }
        }
        self.previews = live;
    }

    /// Hovered slot first, then the first empty one.
    fn drop_slot(&self) -> SlotId {
        self.drop_target
            .or_else(|| {
                SlotId::ALL
                    .into_iter()
                    .find(|slot| self.workflow.slot(*slot).is_none())
            })
            .unwrap_or(SlotId::First)
    }
}

fn mode_button<'a>(
    label: &'a str,
    slot: SlotId,
    mode: AcquisitionMode,
    current: AcquisitionMode,
) -> Element<'a, Message> {
    let style = if mode == current {
        button::primary
    } else {
        button::secondary
    };
    button(text(label).size(14))
        .style(style)
        .on_press(Message::SetMode(slot, mode))
        .into()
}

fn result_panel<'a>(view: &ResultView) -> Element<'a, Message> {
    let body: Column<'a, Message> = match view {
        ResultView::Hidden => Column::new(),
        ResultView::Busy => Column::new().push(text("Analyzing...").size(16)),
        ResultView::Failure(message) => {
            Column::new().push(text(message.clone()).size(16).color(LOW_TONE))
        }
        ResultView::Success(summary) => {
            let tone = if summary.similarity_is_high() {
                HIGH_TONE
            } else {
                LOW_TONE
            };
            column![
                text("Comparison Result").size(22),
                text(summary.similarity_label()).size(28).color(tone),
                text(format!("Distance: {}", summary.distance_text())).size(14),
                text(format!("Model Used: {}", summary.model_used)).size(14),
                text(summary.verdict()).size(18).color(if summary.verified {
                    HIGH_TONE
                } else {
                    LOW_TONE
                }),
            ]
            .spacing(6)
        }
    };

    Container::new(body.padding(6)).width(Length::Fill).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> Compare {
        Compare {
            workflow: CompareWorkflow::new(EmbeddingModel::default()),
            client: Err("offline".into()),
            camera: Arc::new(CommandCamera::default()),
            previews: HashMap::new(),
            drop_target: None,
            warning: None,
        }
    }

    fn png() -> MediaFile {
        MediaFile::new("face.png", Some("image/png".into()), vec![0x89, 0x50, 0x4E, 0x47])
    }

    #[test]
    fn drop_goes_to_first_empty_slot_without_hover() {
        let mut app = app();
        assert_eq!(app.drop_slot(), SlotId::First);
        let outcome = app.workflow.select_file(SlotId::First, png());
        app.settle(outcome);
        assert_eq!(app.drop_slot(), SlotId::Second);
        app.drop_target = Some(SlotId::First);
        assert_eq!(app.drop_slot(), SlotId::First);
    }

    #[test]
    fn previews_follow_populated_slots() {
        let mut app = app();
        let outcome = app.workflow.select_file(SlotId::First, png());
        app.settle(outcome);
        let outcome = app.workflow.select_file(SlotId::First, png());
        app.settle(outcome);
        assert_eq!(app.previews.len(), 1);
        assert_eq!(app.workflow.ledger().live(), 1);
    }

    #[test]
    fn rejected_file_shows_warning() {
        let mut app = app();
        let text = MediaFile::new("notes.txt", Some("text/plain".into()), b"hi".to_vec());
        let outcome = app.workflow.select_file(SlotId::Second, text);
        app.settle(outcome);
        assert_eq!(app.warning.as_deref(), Some("Select a valid image"));
        assert!(app.previews.is_empty());
    }

    #[test]
    fn submit_without_client_warns_and_settles() {
        let mut app = app();
        for slot in SlotId::ALL {
            let outcome = app.workflow.select_file(slot, png());
            app.settle(outcome);
        }
        let _ = Compare::update(&mut app, Message::Submit);
        assert!(app
            .warning
            .as_deref()
            .is_some_and(|message| message.contains("offline")));
        assert_eq!(
            app.workflow.state(),
            &rupacore::WorkflowState::Failed(CompareError::Network("offline".into()))
        );
        assert!(app.workflow.can_submit());
    }

    #[test]
    fn missing_image_is_reported_before_client_problems() {
        let mut app = app();
        let outcome = app.workflow.select_file(SlotId::First, png());
        app.settle(outcome);

        let _ = Compare::update(&mut app, Message::Submit);
        assert_eq!(app.warning, None);
        assert_eq!(
            ResultView::of(app.workflow.state()),
            ResultView::Failure("Please provide both images.".into())
        );
    }

    #[test]
    fn cancelled_picker_changes_nothing() {
        let mut app = app();
        let _ = Compare::update(&mut app, Message::FilePicked(SlotId::First, None));
        assert!(app.workflow.slot(SlotId::First).is_none());
        assert_eq!(app.warning, None);
    }
}
