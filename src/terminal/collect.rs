// SPDX-License-Identifier: GPL-3.0-only

//! Dataset capture front end
//!
//! Four form fields gate the session. Once started the camera preview
//! runs continuously and each capture key saves the next dataset image.

use super::{Dialog, FrameWidget, StatusBar, Tui};
use crate::backends::camera::{self, CameraFrame, CameraPipeline, FrameSource};
use crate::config::Config;
use crate::constants::timing;
use crate::errors::CameraError;
use crate::pipelines::dataset::{CaptureSettings, DatasetSession, SessionState};
use crate::pipelines::encoding::JpegWriter;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use image::RgbImage;
use ratatui::{
    Frame,
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

/// Form labels, in field order
pub const FIELD_LABELS: [&str; 4] = [
    "Number of Datasets:",
    "Images per Dataset:",
    "Image Width:",
    "Image Height:",
];

/// Text inputs for the session parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureForm {
    pub fields: [String; 4],
    pub focus: usize,
}

impl CaptureForm {
    pub fn with_values(fields: [String; 4]) -> Self {
        Self { fields, focus: 0 }
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    pub fn previous_field(&mut self) {
        self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
    }

    pub fn push(&mut self, c: char) {
        self.fields[self.focus].push(c);
    }

    pub fn backspace(&mut self) {
        self.fields[self.focus].pop();
    }

    pub fn parse(&self) -> Result<CaptureSettings, crate::errors::InputError> {
        let [datasets, images, width, height] = &self.fields;
        CaptureSettings::parse(datasets, images, width, height)
    }
}

/// Where the tool is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Editing the form; capture disabled
    Form,
    /// Camera open, capture enabled
    Capturing,
    /// Every dataset captured; camera released
    Complete,
}

/// Modal message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub title: String,
    pub body: String,
}

impl Message {
    fn new(title: &str, body: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            body: body.into(),
        }
    }
}

/// What the event loop should do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    Start(CaptureSettings),
    Capture,
}

/// UI state, independent of the camera and the terminal
#[derive(Debug, Clone)]
pub struct CollectState {
    pub form: CaptureForm,
    pub phase: Phase,
    pub message: Option<Message>,
    pub status: String,
}

impl CollectState {
    pub fn new(form: CaptureForm) -> Self {
        Self {
            form,
            phase: Phase::Form,
            message: None,
            status: String::new(),
        }
    }

    /// Map a key press to an action, updating form state on the way
    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Action::Quit;
        }

        // Any key dismisses an open message
        if self.message.take().is_some() {
            return Action::None;
        }

        match self.phase {
            Phase::Form => match key.code {
                KeyCode::Esc => Action::Quit,
                KeyCode::Tab | KeyCode::Down => {
                    self.form.next_field();
                    Action::None
                }
                KeyCode::BackTab | KeyCode::Up => {
                    self.form.previous_field();
                    Action::None
                }
                KeyCode::Backspace => {
                    self.form.backspace();
                    Action::None
                }
                KeyCode::Enter => match self.form.parse() {
                    Ok(settings) => Action::Start(settings),
                    Err(e) => {
                        self.message = Some(Message::new(e.title(), e.to_string()));
                        Action::None
                    }
                },
                KeyCode::Char(c) => {
                    self.form.push(c);
                    Action::None
                }
                _ => Action::None,
            },
            Phase::Capturing => match key.code {
                KeyCode::Char('c') | KeyCode::Char(' ') => Action::Capture,
                KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
                _ => Action::None,
            },
            Phase::Complete => match key.code {
                KeyCode::Enter => {
                    self.phase = Phase::Form;
                    self.status.clear();
                    Action::None
                }
                KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
                _ => Action::None,
            },
        }
    }

    pub fn show_message(&mut self, title: &str, body: impl Into<String>) {
        self.message = Some(Message::new(title, body));
    }

    pub fn capture_enabled(&self) -> bool {
        self.phase == Phase::Capturing
    }
}

/// Camera plus the session it feeds
struct ActiveCapture {
    camera: CameraPipeline,
    session: DatasetSession,
    preview: Option<RgbImage>,
}

/// Run the capture tool until the user quits
pub fn run(config: &Config, form: CaptureForm) -> Result<(), Box<dyn std::error::Error>> {
    gstreamer::init()?;

    let mut terminal = super::init()?;
    let result = run_app(&mut terminal, config, form);
    super::restore(&mut terminal)?;
    result
}

fn run_app(
    terminal: &mut Tui,
    config: &Config,
    form: CaptureForm,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut state = CollectState::new(form);
    let mut active: Option<ActiveCapture> = None;

    loop {
        if let Some(capture) = active.as_mut() {
            // Zero timeout: take a frame if one is queued, otherwise keep the last one
            if let Ok(frame) = capture.camera.next_frame(Duration::ZERO) {
                match frame.to_rgb_image() {
                    Ok(image) => capture.preview = Some(image),
                    Err(e) => warn!(error = %e, "Dropping preview frame"),
                }
            }
        }

        terminal.draw(|f| draw(f, &state, active.as_ref()))?;

        if !event::poll(timing::PREVIEW_TICK)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match state.handle_key(key) {
            Action::None => {}
            Action::Quit => break,
            Action::Start(settings) => {
                // Release any previous camera before reopening
                active = None;
                match start_capture(config, settings) {
                    Ok(capture) => {
                        state.phase = Phase::Capturing;
                        state.status = capture.session.status_text();
                        active = Some(capture);
                    }
                    Err(e) => {
                        error!(error = %e, "Unable to access the camera");
                        state.show_message("Camera Error", "Unable to access the camera.");
                    }
                }
            }
            Action::Capture => {
                let Some(capture) = active.as_mut() else {
                    continue;
                };
                let frame = match capture.camera.next_frame(timing::FRAME_TIMEOUT) {
                    Ok(frame) => frame,
                    Err(e) => {
                        error!(error = %e, "Failed to capture image");
                        state.show_message("Capture Error", "Failed to capture image.");
                        continue;
                    }
                };

                match capture_frame(&mut capture.session, &frame) {
                    Ok((path, SessionState::Complete)) => {
                        info!(path = %path.display(), "Last image captured");
                        // Dropping the pipeline releases the camera
                        active = None;
                        state.phase = Phase::Complete;
                        state.status = "Capture complete!".to_string();
                        state.show_message(
                            "Capture Complete",
                            "All datasets and images have been captured.",
                        );
                    }
                    Ok((path, _)) => {
                        state.status = format!(
                            "{} | Captured {}",
                            capture.session.status_text(),
                            path.display()
                        );
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to save image");
                        state.show_message("Capture Error", e.to_string());
                    }
                }
            }
        }
    }

    Ok(())
}

fn start_capture(config: &Config, settings: CaptureSettings) -> Result<ActiveCapture, CameraError> {
    let mut camera = camera::open_camera(config.camera_index)?;

    let (width, height) = settings.capture_resolution();
    if let Err(e) = camera.request_resolution(width, height) {
        warn!(error = %e, "Could not change camera resolution");
    }

    let session = DatasetSession::new(settings, config.dataset_root.clone())
        .with_writer(JpegWriter::new(config.jpeg_quality));
    info!(?settings, root = %config.dataset_root.display(), "Capture session started");

    Ok(ActiveCapture {
        camera,
        session,
        preview: None,
    })
}

fn capture_frame(
    session: &mut DatasetSession,
    frame: &CameraFrame,
) -> Result<(PathBuf, SessionState), crate::errors::CaptureError> {
    let outcome = session.capture(frame)?;
    Ok((outcome.path, outcome.state))
}

fn draw(f: &mut Frame, state: &CollectState, active: Option<&ActiveCapture>) {
    let [form_area, preview_area, help_area, status_area] = Layout::vertical([
        Constraint::Length(FIELD_LABELS.len() as u16 + 2),
        Constraint::Min(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(f.area());

    let editing = state.phase == Phase::Form;
    let lines: Vec<Line> = FIELD_LABELS
        .iter()
        .zip(state.form.fields.iter())
        .enumerate()
        .map(|(i, (label, value))| {
            let focused = editing && i == state.form.focus;
            let value_style = if focused {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            let cursor = if focused { "_" } else { "" };
            Line::from(vec![
                Span::raw(format!("{:<22}", label)),
                Span::styled(format!("{}{}", value, cursor), value_style),
            ])
        })
        .collect();
    f.render_widget(
        Paragraph::new(lines).block(Block::bordered().title("Image Capture Tool")),
        form_area,
    );

    let placeholder = match state.phase {
        Phase::Form => "Fill in the form and press Enter to start capturing",
        Phase::Capturing => "Waiting for camera...",
        Phase::Complete => "Capture complete!",
    };
    f.render_widget(
        FrameWidget::new(active.and_then(|a| a.preview.as_ref())).placeholder(placeholder),
        preview_area,
    );

    let help = match state.phase {
        Phase::Form => "Tab/Up/Down: field | Enter: start capturing | Esc: quit",
        Phase::Capturing => "c/Space: capture image | q/Esc: quit",
        Phase::Complete => "Enter: new session | q/Esc: quit",
    };
    f.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::Gray)),
        help_area,
    );
    f.render_widget(
        StatusBar {
            message: &state.status,
        },
        status_area,
    );

    if let Some(message) = &state.message {
        f.render_widget(
            Dialog {
                title: &message.title,
                message: &message.body,
            },
            f.area(),
        );
    }
}
