use std::cmp::min;
use std::mem;

use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use tracing::debug;

use crate::config::Config;
use crate::controller::{StateController, UiMode};
use crate::models::{Child, MAX_RATING};
use crate::storage::{SqliteStorage, Storage, StorageError};

use super::forms::{ConfirmRemove, NameForm};
use super::helpers::{centered_rect, rating_bar, rating_style, surface_error};

/// Rows reserved for the title bar.
const HEADER_HEIGHT: u16 = 3;
/// Footer space reserved for the snackbar/status line and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Height of one child card: border, name, rating bar, border.
const CHILD_CARD_HEIGHT: u16 = 4;

/// Dialogs layered on top of the list. The add dialog mirrors the
/// controller's `AddDialogOpen` mode; rename and remove are sub-dialogs of
/// edit mode that only the UI knows about.
enum Overlay {
    None,
    AddChild(NameForm),
    Rename { original: String, form: NameForm },
    ConfirmRemove(ConfirmRemove),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Terminal front-end around the [`StateController`].
pub struct App<S: Storage = SqliteStorage> {
    controller: StateController<S>,
    transitions: Receiver<UiMode>,
    selected: usize,
    overlay: Overlay,
    status: Option<StatusMessage>,
    rating_step: i64,
}

impl<S: Storage> App<S> {
    pub fn new(mut controller: StateController<S>, config: &Config) -> Self {
        let transitions = controller.subscribe();
        Self {
            controller,
            transitions,
            selected: 0,
            overlay: Overlay::None,
            status: None,
            rating_step: config.rating_step.clamp(1, MAX_RATING),
        }
    }

    pub fn controller(&self) -> &StateController<S> {
        &self.controller
    }

    /// Save everything before the terminal goes away.
    pub fn shutdown(&mut self) -> Result<()> {
        self.controller
            .teardown()
            .context("failed to save children on exit")
    }

    /// Dispatch a key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let overlay = mem::replace(&mut self.overlay, Overlay::None);

        let overlay = match overlay {
            Overlay::AddChild(form) => self.handle_add_child(code, form),
            Overlay::Rename { original, form } => self.handle_rename(code, original, form),
            Overlay::ConfirmRemove(confirm) => self.handle_confirm_remove(code, confirm),
            Overlay::None => match self.controller.mode() {
                UiMode::ShowingSnackbar(_) => self.handle_snackbar_key(code, &mut exit),
                UiMode::EditMode => self.handle_edit_key(code, &mut exit),
                UiMode::Normal | UiMode::AddDialogOpen => {
                    self.handle_normal_key(code, &mut exit)
                }
            },
        };

        self.overlay = overlay;
        self.sync_transitions();
        Ok(exit)
    }

    /// Drain the controller's transition stream and keep the add dialog in
    /// step with it.
    fn sync_transitions(&mut self) {
        for mode in self.transitions.try_iter() {
            debug!(?mode, "ui observed transition");
            match mode {
                UiMode::AddDialogOpen => {
                    if !matches!(self.overlay, Overlay::AddChild(_)) {
                        self.overlay = Overlay::AddChild(NameForm::default());
                    }
                }
                _ => {
                    if matches!(self.overlay, Overlay::AddChild(_)) {
                        self.overlay = Overlay::None;
                    }
                }
            }
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Overlay {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                *exit = true;
            }
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = self.child_count().saturating_sub(1),
            KeyCode::Left => self.nudge_rating(-1),
            KeyCode::Right => self.nudge_rating(1),
            KeyCode::PageDown => self.nudge_rating(-self.rating_step),
            KeyCode::PageUp => self.nudge_rating(self.rating_step),
            KeyCode::Char('+') | KeyCode::Char('a') | KeyCode::Char('A') => {
                self.clear_status();
                self.controller.open_add_dialog();
            }
            KeyCode::Char('e') | KeyCode::Char('E') => {
                self.clear_status();
                self.controller.enter_edit();
                if self.controller.mode() != UiMode::EditMode {
                    self.set_status("Nothing to edit yet.", StatusKind::Error);
                }
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                self.clear_status();
                let result = self.controller.send();
                self.report(result, "failed to send report");
            }
            _ => {}
        }
        Overlay::None
    }

    fn handle_snackbar_key(&mut self, code: KeyCode, exit: &mut bool) -> Overlay {
        self.controller.dismiss_snackbar();
        match code {
            KeyCode::Enter | KeyCode::Esc => Overlay::None,
            _ => self.handle_normal_key(code, exit),
        }
    }

    fn handle_edit_key(&mut self, code: KeyCode, exit: &mut bool) -> Overlay {
        match code {
            KeyCode::Char('q') => {
                *exit = true;
            }
            KeyCode::Esc | KeyCode::Char('e') | KeyCode::Char('E') => {
                self.clear_status();
                self.controller.exit_edit();
            }
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = self.child_count().saturating_sub(1),
            KeyCode::Enter | KeyCode::Char('r') | KeyCode::Char('R') => {
                if let Some(child) = self.current_child() {
                    return Overlay::Rename {
                        original: child.name.clone(),
                        form: NameForm::from_child(child),
                    };
                }
            }
            KeyCode::Char('-') | KeyCode::Delete => {
                if let Some(child) = self.current_child() {
                    return Overlay::ConfirmRemove(ConfirmRemove::from(child));
                }
            }
            _ => {}
        }
        Overlay::None
    }

    fn handle_add_child(&mut self, code: KeyCode, mut form: NameForm) -> Overlay {
        match code {
            KeyCode::Esc => {
                self.controller.dismiss_add_dialog();
                return Overlay::None;
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => {
                let name = form.name.trim().to_string();
                if let Err(err) = self.controller.request_add(&name) {
                    form.error = Some(self.storage_failure(err, "failed to add child"));
                } else if self.controller.mode() == UiMode::Normal {
                    self.select_name(&name);
                    self.set_status(format!("Added {name}."), StatusKind::Info);
                }
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Overlay::AddChild(form)
    }

    fn handle_rename(&mut self, code: KeyCode, original: String, mut form: NameForm) -> Overlay {
        match code {
            KeyCode::Esc => {
                self.set_status("Rename cancelled.", StatusKind::Info);
                return Overlay::None;
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => {
                let name = form.name.trim().to_string();
                match self.controller.rename(&original, &name) {
                    Ok(()) => {
                        if self.controller.mode() == UiMode::Normal {
                            self.select_name(&name);
                            self.set_status(
                                format!("Renamed {original} to {name}."),
                                StatusKind::Info,
                            );
                        }
                        return Overlay::None;
                    }
                    Err(err) => {
                        form.error = Some(self.storage_failure(err, "failed to rename child"));
                    }
                }
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Overlay::Rename { original, form }
    }

    fn handle_confirm_remove(&mut self, code: KeyCode, confirm: ConfirmRemove) -> Overlay {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Removal cancelled.", StatusKind::Info);
                Overlay::None
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.controller.remove(&confirm.name) {
                    Ok(()) => {
                        self.clamp_selection();
                        self.set_status(format!("Removed {}.", confirm.name), StatusKind::Info);
                        Overlay::None
                    }
                    Err(err) => {
                        self.storage_failure(err, "failed to remove child");
                        Overlay::ConfirmRemove(confirm)
                    }
                }
            }
            _ => Overlay::ConfirmRemove(confirm),
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_header(frame, chunks[0]);
        self.draw_children(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);

        match &self.overlay {
            Overlay::AddChild(form) => self.draw_name_form(frame, area, "Add Child", form),
            Overlay::Rename { form, .. } => self.draw_name_form(frame, area, "Rename Child", form),
            Overlay::ConfirmRemove(confirm) => self.draw_confirm_remove(frame, area, confirm),
            Overlay::None => {}
        }
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::styled(
            "Santa Reporter",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )];
        if self.controller.mode() == UiMode::EditMode {
            spans.push(Span::styled(
                "  [editing]",
                Style::default().fg(Color::Yellow),
            ));
        }
        if self.controller.is_dirty() {
            spans.push(Span::styled(
                "  * unsent changes",
                Style::default().fg(Color::Magenta),
            ));
        }

        let header = Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::BOTTOM));
        frame.render_widget(header, area);
    }

    fn draw_children(&self, frame: &mut Frame, area: Rect) {
        let children = self.controller.children();
        if children.is_empty() || area.height == 0 {
            let message = Paragraph::new("No children yet. Press '+' to add one.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::NONE));
            frame.render_widget(message, area);
            return;
        }

        let card_height = CHILD_CARD_HEIGHT as usize;
        let capacity = ((area.height as usize) / card_height).max(1);
        let len = children.len();
        let selected = min(self.selected, len - 1);
        let mut start = if selected >= capacity {
            selected + 1 - capacity
        } else {
            0
        };
        if start + capacity > len {
            start = len.saturating_sub(capacity);
        }
        let end = min(start + capacity, len);

        let constraints: Vec<Constraint> = (start..end)
            .map(|_| Constraint::Length(CHILD_CARD_HEIGHT))
            .collect();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let editing = self.controller.mode() == UiMode::EditMode;
        for (chunk, index) in rows.iter().zip(start..end) {
            if chunk.height == 0 {
                continue;
            }
            let is_selected = index == selected;
            let highlight = if editing { Color::Cyan } else { Color::Yellow };
            let block = if is_selected {
                Block::default()
                    .borders(Borders::ALL)
                    .style(Style::default().fg(highlight))
            } else {
                Block::default().borders(Borders::ALL)
            };
            let inner_width = chunk.width.saturating_sub(2) as usize;
            let lines = child_card_lines(&children[index], inner_width, is_selected);
            let card = Paragraph::new(lines).block(block);
            frame.render_widget(card, *chunk);
        }
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let UiMode::ShowingSnackbar(message) = self.controller.mode() {
            Line::from(vec![
                Span::styled(
                    message.text(),
                    Style::default().fg(Color::White).bg(Color::Red),
                ),
                Span::styled("  [Enter] OK", Style::default().fg(Color::Gray)),
            ])
        } else if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let keys: &[(&str, &str)] = match (&self.overlay, self.controller.mode()) {
            (Overlay::ConfirmRemove(_), _) => &[("[y]", " Remove   "), ("[n/Esc]", " Cancel")],
            (Overlay::AddChild(_), _) | (Overlay::Rename { .. }, _) => {
                &[("[Enter]", " Save   "), ("[Esc]", " Cancel")]
            }
            (_, UiMode::EditMode) => &[
                ("[↑↓]", " Select   "),
                ("[Enter]", " Rename   "),
                ("[-]", " Remove   "),
                ("[Esc]", " Done"),
            ],
            _ => &[
                ("[↑↓]", " Select   "),
                ("[←→]", " Rate   "),
                ("[+]", " Add   "),
                ("[e]", " Edit   "),
                ("[s]", " Send   "),
                ("[q]", " Quit"),
            ],
        };

        let spans: Vec<Span<'static>> = keys
            .iter()
            .flat_map(|(key, label)| {
                [
                    Span::styled(key.to_string(), key_style),
                    Span::raw(label.to_string()),
                ]
            })
            .collect();
        Line::from(spans)
    }

    fn draw_name_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &NameForm) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![form.build_line("Name"), Line::from("")];
        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let prefix = "Name: ".len() as u16;
        frame.set_cursor_position((inner.x + prefix + form.value_len() as u16, inner.y));
    }

    fn draw_confirm_remove(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmRemove) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Confirm Removal")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!(
                "Remove {} (rating {}) from the list?",
                confirm.name, confirm.rating
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    /// Move the selected child's rating by `delta` points.
    fn nudge_rating(&mut self, delta: i64) {
        let Some(child) = self.current_child() else {
            return;
        };
        let name = child.name.clone();
        let target = child.rating.saturating_add(delta);
        self.controller.update_rating(&name, target as f64);
        self.select_name(&name);
    }

    /// Log a storage failure and show its root cause in the footer.
    fn storage_failure(&mut self, err: StorageError, context: &'static str) -> String {
        let err = anyhow::Error::new(err).context(context);
        tracing::error!(error = ?err, "storage operation failed");
        let message = surface_error(&err);
        self.set_status(message.clone(), StatusKind::Error);
        message
    }

    fn report(&mut self, result: Result<(), StorageError>, context: &'static str) {
        if let Err(err) = result {
            self.storage_failure(err, context);
        }
    }

    fn set_status<T: Into<String>>(&mut self, text: T, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    fn current_child(&self) -> Option<&Child> {
        self.controller.children().get(self.selected)
    }

    fn child_count(&self) -> usize {
        self.controller.children().len()
    }

    fn select_name(&mut self, name: &str) {
        if let Some(index) = self
            .controller
            .children()
            .iter()
            .position(|child| child.name == name)
        {
            self.selected = index;
        }
    }

    fn move_selection(&mut self, offset: isize) {
        let len = self.child_count();
        if len == 0 {
            return;
        }
        let target = (self.selected as isize + offset).clamp(0, len as isize - 1);
        self.selected = target as usize;
    }

    fn clamp_selection(&mut self) {
        self.selected = min(self.selected, self.child_count().saturating_sub(1));
    }
}

/// Two text rows for a child card: the name, then the naughty/nice bar.
fn child_card_lines(child: &Child, width: usize, selected: bool) -> Vec<Line<'static>> {
    let name = if selected {
        format!("▶ {child}")
    } else {
        child.to_string()
    };
    let name_line = Line::from(Span::styled(
        name,
        Style::default().add_modifier(Modifier::BOLD),
    ));

    let rating_text = format!(" {:>3}", child.rating);
    let labels = "naughty  nice".len() + 2;
    let bar_width = width.saturating_sub(labels + rating_text.len());
    let rating_line = Line::from(vec![
        Span::styled("naughty ", Style::default().fg(Color::Gray)),
        Span::styled(
            rating_bar(child.rating, bar_width),
            rating_style(child.rating),
        ),
        Span::styled(" nice", Style::default().fg(Color::Gray)),
        Span::raw(rating_text),
    ]);

    vec![name_line, rating_line]
}
