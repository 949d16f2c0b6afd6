// SPDX-License-Identifier: GPL-3.0-only

//! Terminal front ends
//!
//! Camera images are drawn with Unicode half-block characters, two
//! vertical pixels per cell.
//!
//! - [`collect`]: dataset capture form with live preview
//! - [`motion`]: difference-mask preview for `detect --preview`

pub mod collect;
pub mod motion;

use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use image::RgbImage;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Clear, Paragraph, Widget, Wrap},
};
use std::io::{self, Stdout, stdout};

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Switch to the alternate screen in raw mode
pub fn init() -> io::Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

/// Undo [`init`]
pub fn restore(terminal: &mut Tui) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

/// Widget that renders an image using half-block characters
pub struct FrameWidget<'a> {
    image: Option<&'a RgbImage>,
    placeholder: &'a str,
}

impl<'a> FrameWidget<'a> {
    pub fn new(image: Option<&'a RgbImage>) -> Self {
        Self {
            image,
            placeholder: "Waiting for camera...",
        }
    }

    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = placeholder;
        self
    }
}

impl Widget for FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(image) = self.image.filter(|i| i.width() > 0 && i.height() > 0) else {
            let msg = self.placeholder;
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, Style::default());
            }
            return;
        };

        let (display_width, display_height) =
            fit_dimensions(image.width(), image.height(), area.width, area.height);
        if display_width == 0 || display_height == 0 {
            return;
        }

        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = image.width() as f64 / display_width as f64;
        let y_scale = image.height() as f64 / (display_height * 2) as f64;

        for ty in 0..display_height {
            for tx in 0..display_width {
                let src_x = ((tx as f64 * x_scale) as u32).min(image.width() - 1);
                let src_top = ((ty as f64 * 2.0 * y_scale) as u32).min(image.height() - 1);
                let src_bottom =
                    (((ty as f64 * 2.0 + 1.0) * y_scale) as u32).min(image.height() - 1);

                let [tr, tg, tb] = image.get_pixel(src_x, src_top).0;
                let [br, bg, bb] = image.get_pixel(src_x, src_bottom).0;

                if let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(Color::Rgb(tr, tg, tb));
                    cell.set_bg(Color::Rgb(br, bg, bb));
                }
            }
        }
    }
}

/// Largest cell size showing a `width` x `height` image at its aspect ratio
///
/// Each cell holds two vertical pixels, so the usable pixel height is
/// twice the number of rows.
pub fn fit_dimensions(width: u32, height: u32, cols: u16, rows: u16) -> (u16, u16) {
    if width == 0 || height == 0 || cols == 0 || rows == 0 {
        return (0, 0);
    }

    let aspect = width as f64 / height as f64;
    let term_width = cols as f64;
    let term_height = (rows as u32 * 2) as f64;

    if term_width / term_height > aspect {
        let h = term_height;
        let w = h * aspect;
        ((w as u16).min(cols), ((h / 2.0) as u16).min(rows))
    } else {
        let w = term_width;
        let h = w / aspect;
        ((w as u16).min(cols), ((h / 2.0) as u16).min(rows))
    }
}

/// Status bar widget
pub struct StatusBar<'a> {
    pub message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default().fg(Color::White).bg(Color::DarkGray);
        buf.set_style(area, style);

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(area.x, area.y, text, style);
    }
}

/// Modal message box
pub struct Dialog<'a> {
    pub title: &'a str,
    pub message: &'a str,
}

impl Widget for Dialog<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = (self.message.len().max(self.title.len()) as u16 + 4)
            .max(24)
            .min(area.width);
        let [row] = Layout::vertical([Constraint::Length(5)])
            .flex(Flex::Center)
            .areas(area);
        let [popup] = Layout::horizontal([Constraint::Length(width)])
            .flex(Flex::Center)
            .areas(row);

        Clear.render(popup, buf);
        Paragraph::new(vec![
            Line::from(self.message),
            Line::from(""),
            Line::from("Press any key").style(Style::default().fg(Color::DarkGray)),
        ])
        .wrap(Wrap { trim: true })
        .block(Block::bordered().title(self.title))
        .render(popup, buf);
    }
}
