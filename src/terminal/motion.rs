// SPDX-License-Identifier: GPL-3.0-only

//! Difference-mask preview for the motion detector

use super::{FrameWidget, StatusBar, Tui};
use crate::pipelines::motion::{DetectionObserver, MotionReport};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use image::{DynamicImage, RgbImage};
use ratatui::layout::{Constraint, Layout};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::warn;

/// Draws each mask and turns `q`/Ctrl+C into a stop request
pub struct MaskPreview<'a> {
    terminal: &'a mut Tui,
    stop: Arc<AtomicBool>,
    threshold: u64,
}

impl<'a> MaskPreview<'a> {
    pub fn new(terminal: &'a mut Tui, stop: Arc<AtomicBool>, threshold: u64) -> Self {
        Self {
            terminal,
            stop,
            threshold,
        }
    }

    fn poll_quit(&self) -> std::io::Result<bool> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                let ctrl_c = key.code == KeyCode::Char('c')
                    && key.modifiers.contains(KeyModifiers::CONTROL);
                if ctrl_c || matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

/// Status line for a comparison
pub fn status_line(report: &MotionReport, threshold: u64, saved: Option<&Path>) -> String {
    let mut line = format!("Changed pixels: {} / {}", report.changed_pixels, threshold);
    if let Some(path) = saved {
        line.push_str(&format!(" | Motion detected! Saved {}", path.display()));
    }
    line.push_str(" | q: quit");
    line
}

impl DetectionObserver for MaskPreview<'_> {
    fn on_report(&mut self, report: &MotionReport, saved: Option<&Path>) {
        let mask: RgbImage = DynamicImage::ImageLuma8(report.mask.clone()).to_rgb8();
        let status = status_line(report, self.threshold, saved);

        let drawn = self.terminal.draw(|f| {
            let [mask_area, status_area] =
                Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(f.area());
            f.render_widget(FrameWidget::new(Some(&mask)), mask_area);
            f.render_widget(StatusBar { message: &status }, status_area);
        });
        if let Err(e) = drawn {
            warn!(error = %e, "Failed to draw motion preview");
        }

        match self.poll_quit() {
            Ok(true) => self.stop.store(true, Ordering::SeqCst),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "Failed to read terminal input"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GrayImage;

    #[test]
    fn test_status_line_mentions_saved_file() {
        let report = MotionReport {
            changed_pixels: 812,
            motion: true,
            mask: GrayImage::new(1, 1),
        };
        let line = status_line(&report, 500, Some(Path::new("captured_changes/motion_1.jpg")));
        assert!(line.starts_with("Changed pixels: 812 / 500"));
        assert!(line.contains("captured_changes/motion_1.jpg"));

        let quiet = MotionReport {
            motion: false,
            changed_pixels: 3,
            ..report
        };
        assert!(!status_line(&quiet, 500, None).contains("Motion detected"));
    }
}
