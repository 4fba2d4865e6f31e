use iced::{
    alignment,
    event::{self, Event as IcedEvent},
    font,
    keyboard::{self, Key},
    mouse, time,
    widget::{
        button, column, container, horizontal_rule, horizontal_space, mouse_area, rich_text, row,
        scrollable, span, text, text::Span, text_input,
    },
    window::{self, Level},
    clipboard, Background, Border, Color, Element, Font, Length, Padding, Subscription, Task,
    Theme,
};
use once_cell::sync::OnceCell;
use std::time::Duration;

use crate::bubbles::{BubbleContainer, BubbleFrame, Entry};
use crate::chrome::{ResizeCursor, WindowController};
use crate::config::Config;
use crate::conversation::{Conversation, Phase};
use crate::geometry::{self, Insets, PlacementRules, Point, ScreenRegion, Size, WindowBounds};
use crate::message::Sender;
use crate::ollama::{CompletionResult, OllamaClient};
use crate::render::{Block, Markup, Span as MarkupSpan};

pub const TITLE: &str = "Side Chat";

/// Padding around the whole window content.
const OUTER_PADDING: u16 = 10;
const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Rules for the startup placement. `Position::SpecificWith` takes a plain
/// fn, so they travel through here instead of a capture.
static PLACEMENT: OnceCell<(PlacementRules, Insets)> = OnceCell::new();
/// Bounds chosen when the window was opened, relative to its monitor.
static PLACED: OnceCell<WindowBounds> = OnceCell::new();

/// Settings for the main window: frameless, resizable, and placed against
/// the right edge of whichever monitor the host opens it on.
pub fn window_settings(config: &Config) -> window::Settings {
    let _ = PLACEMENT.set((config.window.placement_rules(), config.window.screen_insets()));

    window::Settings {
        size: iced::Size::new(config.window.width as f32, config.window.min_height as f32),
        position: window::Position::SpecificWith(place_on_monitor),
        min_size: Some(iced::Size::new(
            config.window.min_width as f32,
            config.window.min_height as f32,
        )),
        decorations: false,
        resizable: true,
        level: if config.window.always_on_top {
            Level::AlwaysOnTop
        } else {
            Level::Normal
        },
        ..Default::default()
    }
}

fn place_on_monitor(window: iced::Size, monitor: iced::Size) -> iced::Point {
    let Some((rules, insets)) = PLACEMENT.get() else {
        tracing::warn!(?monitor, "no placement rules, opening at the monitor origin");
        return iced::Point::ORIGIN;
    };

    let placed = placement_for_monitor(monitor, rules, *insets);
    tracing::info!(?placed, ?window, ?monitor, "placing window");
    let _ = PLACED.set(placed);
    iced::Point::new(placed.x as f32, placed.y as f32)
}

/// Startup bounds for a monitor of `size`, in that monitor's coordinates.
/// The host only tells us about the monitor it opens the window on, so the
/// candidate list has exactly one entry.
pub fn placement_for_monitor(size: iced::Size, rules: &PlacementRules, insets: Insets) -> WindowBounds {
    let monitors = [ScreenRegion {
        origin: Point::default(),
        size: Size::new(size.width.round() as i32, size.height.round() as i32),
        insets,
        primary: true,
    }];

    match geometry::monitor_for_pointer(&monitors, None) {
        Some(region) => geometry::resolve_placement(region, rules),
        None => WindowBounds::new(0, 0, rules.width, rules.min_size.height),
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    WindowFound(Option<window::Id>),
    PointerMoved(iced::Point),
    /// Left button down. `captured` when a widget already handled it.
    PointerPressed { captured: bool },
    PointerReleased,
    WindowMoved(iced::Point),
    WindowResized(iced::Size),
    InputChanged(String),
    Submit,
    Completed(CompletionResult),
    Tick,
    CopyLastAnswer,
    Exit,
}

pub struct App {
    config: Config,
    client: OllamaClient,
    conversation: Conversation,
    window: WindowController,
    window_id: Option<window::Id>,
    /// Last pointer position in window coordinates.
    cursor: Point,
    font: Font,
    loading_frame: usize,
    input_id: text_input::Id,
    scroll_id: scrollable::Id,
}

impl App {
    pub fn new(config: Config, client: OllamaClient, font: Font) -> (Self, Task<Message>) {
        let initial = WindowBounds::new(
            0,
            0,
            config.window.width as i32,
            config.window.min_height as i32,
        );
        let window = WindowController::new(
            initial,
            config.window.min_size(),
            config.window.edge_thickness as i32,
        );
        let transcript =
            BubbleContainer::new(config.style.wide_margin, config.style.narrow_margin);

        let input_id = text_input::Id::unique();

        let app = App {
            config,
            client,
            conversation: Conversation::new(transcript),
            window,
            window_id: None,
            cursor: Point::default(),
            font,
            loading_frame: 0,
            input_id: input_id.clone(),
            scroll_id: scrollable::Id::unique(),
        };

        let focus_task = text_input::focus(input_id);
        let window_task = window::get_latest().map(Message::WindowFound);

        (app, Task::batch([focus_task, window_task]))
    }

    pub fn title(&self) -> String {
        TITLE.to_string()
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::WindowFound(Some(id)) => {
                self.window_id = Some(id);
                let placement = match PLACED.get() {
                    Some(placed) => self.apply_placement(*placed),
                    None => Task::none(),
                };
                if self.config.window.always_on_top {
                    Task::batch([window::change_level(id, Level::AlwaysOnTop), placement])
                } else {
                    placement
                }
            }
            Message::WindowFound(None) => {
                tracing::warn!("no window id reported, keeping default placement");
                Task::none()
            }
            Message::PointerMoved(position) => {
                self.cursor = to_point(position);
                let resizing = self.window.is_resizing();
                match self.window.pointer_moved(self.cursor) {
                    Some(bounds) if resizing => self.resize_window(bounds),
                    Some(bounds) => self.move_window(bounds),
                    None => Task::none(),
                }
            }
            Message::PointerPressed { captured } => {
                let press = if captured {
                    self.window.press_edge(self.cursor)
                } else {
                    self.window.press(self.cursor)
                };
                tracing::trace!(?press, captured, "pointer pressed");
                Task::none()
            }
            Message::PointerReleased => {
                self.window.release();
                Task::none()
            }
            Message::WindowMoved(position) => {
                self.window.sync_position(to_point(position));
                Task::none()
            }
            Message::WindowResized(size) => {
                self.window
                    .sync_size(Size::new(size.width.round() as i32, size.height.round() as i32));
                Task::none()
            }
            Message::InputChanged(value) => {
                self.conversation.set_input(value);
                Task::none()
            }
            Message::Submit => {
                let Some((dispatch, _)) = self.conversation.submit() else {
                    return Task::none();
                };
                self.loading_frame = 0;

                let client = self.client.clone();
                let request = Task::perform(
                    async move { client.complete(&dispatch.prompt).await },
                    Message::Completed,
                );

                Task::batch([self.scroll_to_end(), request])
            }
            Message::Completed(result) => {
                let Some(done) = self.conversation.complete(result) else {
                    return Task::none();
                };

                if done.focus_input {
                    Task::batch([self.scroll_to_end(), text_input::focus(self.input_id.clone())])
                } else {
                    self.scroll_to_end()
                }
            }
            Message::Tick => {
                if self.conversation.phase() == Phase::Awaiting {
                    self.loading_frame = (self.loading_frame + 1) % SPINNER_FRAMES.len();
                }
                Task::none()
            }
            Message::CopyLastAnswer => match self.last_answer() {
                Some(answer) => clipboard::write(answer),
                None => Task::none(),
            },
            Message::Exit => iced::exit(),
        }
    }

    /// Adopts the bounds picked when the window opened. The host already put
    /// the window at their origin; only the height still has to follow.
    fn apply_placement(&mut self, placed: WindowBounds) -> Task<Message> {
        let bounds = self.window.set_bounds(placed);
        tracing::debug!(?bounds, "applying startup placement");
        self.resize_window(bounds)
    }

    fn move_window(&self, bounds: WindowBounds) -> Task<Message> {
        match self.window_id {
            Some(id) => window::move_to(id, iced::Point::new(bounds.x as f32, bounds.y as f32)),
            None => Task::none(),
        }
    }

    fn resize_window(&self, bounds: WindowBounds) -> Task<Message> {
        match self.window_id {
            Some(id) => window::resize(
                id,
                iced::Size::new(bounds.width as f32, bounds.height as f32),
            ),
            None => Task::none(),
        }
    }

    fn scroll_to_end(&self) -> Task<Message> {
        scrollable::snap_to(self.scroll_id.clone(), scrollable::RelativeOffset::END)
    }

    fn last_answer(&self) -> Option<String> {
        self.conversation
            .transcript()
            .iter()
            .rev()
            .find(|e| e.bubble.message.sender == Sender::Assistant && !e.bubble.message.is_error)
            .map(|e| e.bubble.message.text.clone())
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let timer = if self.conversation.phase() == Phase::Awaiting {
            time::every(Duration::from_millis(80)).map(|_| Message::Tick)
        } else {
            Subscription::none()
        };

        let events = event::listen_with(|event, status, _id| match event {
            IcedEvent::Keyboard(keyboard::Event::KeyPressed {
                key: Key::Named(keyboard::key::Named::Escape),
                ..
            }) => Some(Message::Exit),
            IcedEvent::Mouse(mouse::Event::CursorMoved { position }) => {
                Some(Message::PointerMoved(position))
            }
            IcedEvent::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                Some(Message::PointerPressed {
                    captured: status == event::Status::Captured,
                })
            }
            IcedEvent::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                Some(Message::PointerReleased)
            }
            IcedEvent::Window(window::Event::Moved(position)) => {
                Some(Message::WindowMoved(position))
            }
            IcedEvent::Window(window::Event::Resized(size)) => Some(Message::WindowResized(size)),
            _ => None,
        });

        Subscription::batch([timer, events])
    }

    pub fn view(&self) -> Element<Message> {
        let style = &self.config.style;

        let header = row![
            text(TITLE).size(16).font(self.bold()),
            text(self.client.get_model()).size(12),
            horizontal_space(),
            button(text("[Copy]").size(12))
                .on_press_maybe(self.last_answer().map(|_| Message::CopyLastAnswer))
                .padding(4),
            button(text("X").size(12)).on_press(Message::Exit).padding(4),
        ]
        .spacing(8)
        .align_y(alignment::Vertical::Center);

        let content_width = (self.window.bounds().width - 2 * i32::from(OUTER_PADDING)).max(0) as u32;
        let frames = self.conversation.transcript().relayout(content_width);

        let bubbles = column(
            self.conversation
                .transcript()
                .iter()
                .zip(frames)
                .map(|(entry, frame)| self.bubble_view(entry, frame)),
        )
        .spacing(8)
        .width(Length::Fill);

        let transcript = scrollable(bubbles)
            .id(self.scroll_id.clone())
            .height(Length::Fill);

        let enabled = self.conversation.input_enabled();
        let input = text_input("Type your message...", self.conversation.input())
            .on_input_maybe(enabled.then_some(Message::InputChanged))
            .on_submit(Message::Submit)
            .padding(10)
            .size(style.base_size)
            .id(self.input_id.clone());

        let mut content = column![header, transcript].spacing(10);

        if self.conversation.phase() == Phase::Awaiting {
            content = content.push(
                row![
                    text(SPINNER_FRAMES[self.loading_frame]).size(18),
                    text("Thinking...").size(style.base_size),
                ]
                .spacing(8)
                .align_y(alignment::Vertical::Center),
            );
        }

        let root = container(content.push(input))
            .padding(OUTER_PADDING)
            .width(Length::Fill)
            .height(Length::Fill);

        let cursor = self.window.hover_cursor(self.cursor);
        let area = mouse_area(root);
        match interaction(cursor, self.window.is_dragging()) {
            Some(glyph) => area.interaction(glyph).into(),
            None => area.into(),
        }
    }

    fn bubble_view<'a>(&'a self, entry: &'a Entry, frame: BubbleFrame) -> Element<'a, Message> {
        let style = &self.config.style;
        let message = &entry.bubble.message;
        let fill = if message.is_error {
            style.error_bubble
        } else {
            match message.sender {
                Sender::User => style.user_bubble,
                Sender::Assistant => style.assistant_bubble,
            }
        };
        let fill = rgb(fill);
        let text_color = rgb(style.text_color);

        let bubble = container(self.markup_view(&entry.bubble.markup))
            .padding(10)
            .width(Length::Fill)
            .style(move |_theme: &Theme| container::Style {
                text_color: Some(text_color),
                background: Some(Background::Color(fill)),
                border: Border {
                    radius: 8.0.into(),
                    ..Border::default()
                },
                ..container::Style::default()
            });

        container(bubble)
            .padding(Padding {
                top: 0.0,
                bottom: 0.0,
                left: f32::from(frame.margins.left),
                right: f32::from(frame.margins.right),
            })
            .width(Length::Fill)
            .into()
    }

    fn markup_view<'a>(&'a self, markup: &'a Markup) -> Element<'a, Message> {
        let style = &self.config.style;
        let base = f32::from(style.base_size);

        let blocks = markup.blocks.iter().map(|block| -> Element<'a, Message> {
            match block {
                Block::Heading { level, spans } => {
                    let size = base + f32::from(6u8.saturating_sub(*level)) * 2.0;
                    rich_text(self.spans(spans, true)).size(size).into()
                }
                Block::Paragraph(spans) => rich_text(self.spans(spans, false)).size(base).into(),
                Block::CodeBlock { code, .. } => {
                    let background = rgb(style.code_background);
                    container(text(code.as_str()).font(Font::MONOSPACE).size(base - 1.0))
                        .padding(8)
                        .width(Length::Fill)
                        .style(move |_theme: &Theme| container::Style {
                            background: Some(Background::Color(background)),
                            border: Border {
                                radius: 4.0.into(),
                                ..Border::default()
                            },
                            ..container::Style::default()
                        })
                        .into()
                }
                Block::ListItem { marker, depth, spans } => row![
                    text(marker.as_str()).size(base).width(Length::Fixed(base * 1.6)),
                    rich_text(self.spans(spans, false)).size(base),
                ]
                .padding(Padding {
                    left: *depth as f32 * base * 1.2,
                    ..Padding::ZERO
                })
                .into(),
                Block::Quote(spans) => container(rich_text(self.spans(spans, false)).size(base))
                    .padding(Padding {
                        left: base,
                        ..Padding::ZERO
                    })
                    .into(),
                Block::Rule => horizontal_rule(1).into(),
            }
        });

        column(blocks).spacing(6).into()
    }

    fn spans<'a>(&self, spans: &'a [MarkupSpan], heading: bool) -> Vec<Span<'a, Message>> {
        let style = &self.config.style;
        spans
            .iter()
            .map(|s| {
                let mut font = self.font;
                if s.style.strong || heading {
                    font.weight = font::Weight::Bold;
                }
                if s.style.emphasis {
                    font.style = font::Style::Italic;
                }
                if s.style.code {
                    font = Font::MONOSPACE;
                }

                let piece = span(s.text.as_str()).font(font);
                if s.style.link.is_some() {
                    piece.color(rgb(style.link_color))
                } else if s.style.strikethrough {
                    piece.color(rgb(style.text_color).scale_alpha(0.5))
                } else {
                    piece
                }
            })
            .collect()
    }

    fn bold(&self) -> Font {
        Font {
            weight: font::Weight::Bold,
            ..self.font
        }
    }

    pub fn theme(&self) -> Theme {
        Theme::TokyoNight
    }
}

fn to_point(position: iced::Point) -> Point {
    Point::new(position.x.round() as i32, position.y.round() as i32)
}

fn rgb([r, g, b]: [u8; 3]) -> Color {
    Color::from_rgb8(r, g, b)
}

fn interaction(cursor: ResizeCursor, dragging: bool) -> Option<mouse::Interaction> {
    if dragging {
        return Some(mouse::Interaction::Grabbing);
    }
    match cursor {
        ResizeCursor::Default => None,
        ResizeCursor::Horizontal => Some(mouse::Interaction::ResizingHorizontally),
        ResizeCursor::Vertical => Some(mouse::Interaction::ResizingVertically),
        ResizeCursor::DiagonalNwSe => Some(mouse::Interaction::ResizingDiagonallyDown),
        ResizeCursor::DiagonalNeSw => Some(mouse::Interaction::ResizingDiagonallyUp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OllamaConfig;
    use crate::ollama::InferenceError;

    fn app() -> App {
        let client = OllamaClient::new(&OllamaConfig::default()).unwrap();
        let (mut app, _) = App::new(Config::default(), client, Font::DEFAULT);
        let _ = app.apply_placement(WindowBounds::new(1000, 100, 400, 800));
        app
    }

    fn pointer(app: &mut App, x: f32, y: f32) {
        let _ = app.update(Message::PointerMoved(iced::Point::new(x, y)));
    }

    fn transcript_texts(app: &App) -> Vec<String> {
        app.conversation
            .transcript()
            .iter()
            .map(|e| e.bubble.message.text.clone())
            .collect()
    }

    #[test]
    fn startup_placement_hugs_the_right_edge() {
        let rules = Config::default().window.placement_rules();
        let placed = placement_for_monitor(iced::Size::new(1920.0, 1080.0), &rules, Insets::default());
        assert_eq!(placed, WindowBounds::new(1520, 40, 400, 1000));

        let insets = Insets { top: 0, right: 0, bottom: 48, left: 0 };
        let placed = placement_for_monitor(iced::Size::new(1920.0, 1080.0), &rules, insets);
        assert_eq!(placed, WindowBounds::new(1520, 40, 400, 952));
    }

    #[test]
    fn drag_follows_pointer_through_lagging_window_events() {
        let mut app = app();

        pointer(&mut app, 200.0, 300.0);
        let _ = app.update(Message::PointerPressed { captured: false });
        assert!(app.window.is_dragging());

        pointer(&mut app, 230.0, 290.0);
        assert_eq!(app.window.bounds().origin(), Point::new(1030, 90));

        // The host has not moved yet.
        let _ = app.update(Message::WindowMoved(iced::Point::new(1000.0, 100.0)));
        pointer(&mut app, 240.0, 290.0);
        assert_eq!(app.window.bounds().origin(), Point::new(1040, 90));

        let _ = app.update(Message::WindowMoved(iced::Point::new(1040.0, 90.0)));
        pointer(&mut app, 200.0, 300.0);
        let _ = app.update(Message::PointerReleased);

        assert_eq!(app.window.gesture(), None);
        assert_eq!(app.window.bounds(), WindowBounds::new(1040, 90, 400, 800));
    }

    #[test]
    fn corner_press_resizes_even_when_a_widget_took_it() {
        let mut app = app();

        pointer(&mut app, 395.0, 795.0);
        let _ = app.update(Message::PointerPressed { captured: true });
        assert!(app.window.is_resizing());

        pointer(&mut app, 450.0, 850.0);
        let _ = app.update(Message::PointerReleased);
        assert_eq!(app.window.bounds(), WindowBounds::new(1000, 100, 450, 850));

        // The corner moved with the window; shrinking from it stops at the minimum.
        pointer(&mut app, 445.0, 845.0);
        let _ = app.update(Message::PointerPressed { captured: false });
        pointer(&mut app, 10.0, 10.0);
        let _ = app.update(Message::PointerReleased);
        assert_eq!(app.window.bounds().size(), Size::new(300, 200));
    }

    #[test]
    fn press_consumed_by_the_input_never_drags() {
        let mut app = app();

        pointer(&mut app, 200.0, 770.0);
        let _ = app.update(Message::PointerPressed { captured: true });
        assert_eq!(app.window.gesture(), None);

        pointer(&mut app, 260.0, 700.0);
        assert_eq!(app.window.bounds(), WindowBounds::new(1000, 100, 400, 800));
    }

    #[test]
    fn submit_then_completion_appends_in_order() {
        let mut app = app();

        let _ = app.update(Message::InputChanged("What is 2+2?".into()));
        let _ = app.update(Message::Submit);
        assert_eq!(app.conversation.phase(), Phase::Awaiting);
        assert!(!app.conversation.input_enabled());
        assert_eq!(app.conversation.dispatched(), 1);

        // A second submit while waiting is dropped.
        let _ = app.update(Message::Submit);
        assert_eq!(app.conversation.dispatched(), 1);

        let _ = app.update(Message::Completed(Ok("4".into())));
        assert_eq!(transcript_texts(&app), ["What is 2+2?", "4"]);
        assert!(app.conversation.input_enabled());
        assert_eq!(app.last_answer().as_deref(), Some("4"));
    }

    #[test]
    fn failed_completion_is_not_offered_for_copy() {
        let mut app = app();

        let _ = app.update(Message::InputChanged("hello".into()));
        let _ = app.update(Message::Submit);
        let _ = app.update(Message::Completed(Err(InferenceError::MissingResponse)));

        let texts = transcript_texts(&app);
        assert_eq!(texts.len(), 2);
        assert!(texts[1].starts_with("Error: "));
        assert_eq!(app.last_answer(), None);
    }

    #[test]
    fn empty_submit_sends_nothing() {
        let mut app = app();

        let _ = app.update(Message::InputChanged("   ".into()));
        let _ = app.update(Message::Submit);

        assert_eq!(app.conversation.dispatched(), 0);
        assert_eq!(app.conversation.phase(), Phase::Idle);
        assert!(app.conversation.transcript().is_empty());
    }
}
