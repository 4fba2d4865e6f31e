//! Append-only column of chat bubbles.
//!
//! Bubbles stretch to the container width minus an asymmetric margin: the
//! wide margin sits on the side away from the bubble's alignment so user
//! messages lean right and assistant messages lean left.

use crate::message::{ChatMessage, Sender};
use crate::render::{render, Markup};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
}

impl Alignment {
    pub fn for_sender(sender: Sender) -> Self {
        match sender {
            Sender::User => Alignment::Right,
            Sender::Assistant => Alignment::Left,
        }
    }
}

/// A rendered message. Built once per message and never edited.
#[derive(Debug, Clone, PartialEq)]
pub struct Bubble {
    pub message: ChatMessage,
    pub markup: Markup,
}

impl Bubble {
    pub fn new(message: ChatMessage) -> Self {
        let markup = render(&message);
        Bubble { message, markup }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub bubble: Bubble,
    pub alignment: Alignment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Margins {
    pub left: u16,
    pub right: u16,
}

/// Horizontal placement of one bubble inside the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BubbleFrame {
    pub x: u32,
    pub width: u32,
    pub margins: Margins,
}

/// Returned by [`BubbleContainer::append`]: the hosting scroll region should
/// jump to its maximum vertical offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct ScrollToEnd;

#[derive(Debug, Clone)]
pub struct BubbleContainer {
    entries: Vec<Entry>,
    wide_margin: u16,
    narrow_margin: u16,
}

impl BubbleContainer {
    pub fn new(wide_margin: u16, narrow_margin: u16) -> Self {
        BubbleContainer {
            entries: Vec::new(),
            wide_margin,
            narrow_margin,
        }
    }

    pub fn append(&mut self, bubble: Bubble, align_right: bool) -> ScrollToEnd {
        let alignment = if align_right {
            Alignment::Right
        } else {
            Alignment::Left
        };
        self.entries.push(Entry { bubble, alignment });
        ScrollToEnd
    }

    /// Renders `message` and appends it aligned by sender.
    pub fn push_message(&mut self, message: ChatMessage) -> ScrollToEnd {
        let align_right = Alignment::for_sender(message.sender) == Alignment::Right;
        self.append(Bubble::new(message), align_right)
    }

    pub fn margins(&self, alignment: Alignment) -> Margins {
        match alignment {
            Alignment::Right => Margins {
                left: self.wide_margin,
                right: self.narrow_margin,
            },
            Alignment::Left => Margins {
                left: self.narrow_margin,
                right: self.wide_margin,
            },
        }
    }

    /// Frames for every bubble at `width`, in arrival order. Depends only on
    /// the width and the entries, so repeated calls agree.
    pub fn relayout(&self, width: u32) -> Vec<BubbleFrame> {
        self.entries
            .iter()
            .map(|entry| {
                let margins = self.margins(entry.alignment);
                let horizontal = u32::from(margins.left) + u32::from(margins.right);
                BubbleFrame {
                    x: u32::from(margins.left).min(width),
                    width: width.saturating_sub(horizontal),
                    margins,
                }
            })
            .collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&Entry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container() -> BubbleContainer {
        BubbleContainer::new(48, 8)
    }

    #[test]
    fn keeps_arrival_order_and_sender_alignment() {
        let mut bubbles = container();
        let _ = bubbles.push_message(ChatMessage::user("first"));
        let _ = bubbles.push_message(ChatMessage::assistant("second"));
        let _ = bubbles.push_message(ChatMessage::user("third"));

        let texts: Vec<&str> = bubbles.iter().map(|e| e.bubble.message.text.as_str()).collect();
        assert_eq!(texts, ["first", "second", "third"]);

        let alignments: Vec<Alignment> = bubbles.iter().map(|e| e.alignment).collect();
        assert_eq!(alignments, [Alignment::Right, Alignment::Left, Alignment::Right]);
    }

    #[test]
    fn frames_stretch_to_width_with_asymmetric_margins() {
        let mut bubbles = container();
        let _ = bubbles.append(Bubble::new(ChatMessage::user("a")), true);
        let _ = bubbles.append(Bubble::new(ChatMessage::assistant("a much longer answer")), false);

        let frames = bubbles.relayout(400);
        assert_eq!(frames[0], BubbleFrame { x: 48, width: 344, margins: Margins { left: 48, right: 8 } });
        assert_eq!(frames[1], BubbleFrame { x: 8, width: 344, margins: Margins { left: 8, right: 48 } });
    }

    #[test]
    fn relayout_is_idempotent() {
        let mut bubbles = container();
        for i in 0..5 {
            let _ = bubbles.push_message(ChatMessage::user(format!("q{i}")));
            let _ = bubbles.push_message(ChatMessage::assistant(format!("a{i}")));
        }

        let first = bubbles.relayout(420);
        let second = bubbles.relayout(420);
        assert_eq!(first, second);
        assert_eq!(bubbles.len(), 10);
    }

    #[test]
    fn narrow_container_never_underflows() {
        let mut bubbles = container();
        let _ = bubbles.push_message(ChatMessage::assistant("x"));
        let frames = bubbles.relayout(20);
        assert_eq!(frames[0].width, 0);
        assert!(frames[0].x <= 20);
    }

    #[test]
    fn iterates_newest_first_in_reverse() {
        let mut bubbles = container();
        let _ = bubbles.push_message(ChatMessage::user("q"));
        let _ = bubbles.push_message(ChatMessage::assistant("a"));

        let newest: Vec<&str> = bubbles.iter().rev().map(|e| e.bubble.message.text.as_str()).collect();
        assert_eq!(newest, ["a", "q"]);
    }

    #[test]
    fn append_asks_for_scroll_to_end() {
        let mut bubbles = container();
        assert_eq!(bubbles.push_message(ChatMessage::user("hi")), ScrollToEnd);
        assert!(!bubbles.is_empty());
        assert_eq!(bubbles.last().map(|e| e.alignment), Some(Alignment::Right));
    }
}
