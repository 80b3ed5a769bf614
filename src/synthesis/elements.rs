//! Classified elements and sequence emission

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::command::{Command, CommandSequence};

/// Elements whose vertical centers differ by less than this are one row
pub const ROW_TOLERANCE_PX: f64 = 50.0;

// Inter-step delay sub-ranges, ms. All sit inside the 50–500ms envelope.
const MOVE_DELAY_MS: (u64, u64) = (100, 300);
const CLICK_DELAY_MS: (u64, u64) = (50, 150);
const TYPE_DELAY_MS: (u64, u64) = (200, 500);

/// UI element categories reported by the image-analysis collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Button,
    Textfield,
    Menu,
    Icon,
    Checkbox,
    Label,
    Unknown,
}

impl ElementType {
    /// Elements a synthesized macro interacts with
    pub fn is_interactive(&self) -> bool {
        matches!(
            self,
            ElementType::Button
                | ElementType::Textfield
                | ElementType::Menu
                | ElementType::Icon
                | ElementType::Checkbox
        )
    }
}

/// Pixel bounds of a detected element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    /// Center point of the bounds
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// A classified UI element with detection confidence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedElement {
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub bounds: Bounds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub confidence: f64,
}

/// Order elements for visiting: rows top-to-bottom, then left-to-right
/// within a row. A row opens at the first element whose center is more than
/// [`ROW_TOLERANCE_PX`] below the current row's anchor.
fn visit_order(elements: &[ClassifiedElement]) -> Vec<&ClassifiedElement> {
    let mut by_y: Vec<&ClassifiedElement> = elements.iter().collect();
    by_y.sort_by(|a, b| {
        a.bounds
            .center()
            .1
            .partial_cmp(&b.bounds.center().1)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut rows: Vec<Vec<&ClassifiedElement>> = Vec::new();
    let mut row_anchor_y = f64::NEG_INFINITY;
    for element in by_y {
        let y = element.bounds.center().1;
        match rows.last_mut() {
            Some(row) if (y - row_anchor_y).abs() < ROW_TOLERANCE_PX => row.push(element),
            _ => {
                rows.push(vec![element]);
                row_anchor_y = y;
            }
        }
    }
    for row in &mut rows {
        row.sort_by(|a, b| {
            a.bounds
                .center()
                .0
                .partial_cmp(&b.bounds.center().0)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
    rows.into_iter().flatten().collect()
}

/// Synthesize a macro that visits the interactive elements in reading
/// order, clicking each and typing into textfields, with randomized
/// per-step delays.
pub fn synthesize_sequence<R: Rng>(
    elements: &[ClassifiedElement],
    rng: &mut R,
) -> CommandSequence {
    let mut commands = Vec::new();
    for element in visit_order(elements) {
        if !element.element_type.is_interactive() {
            continue;
        }
        let (cx, cy) = element.bounds.center();
        commands.push(Command::mouse("move", cx, cy));
        commands.push(step_delay(MOVE_DELAY_MS, rng));
        commands.push(Command::mouse("click", cx, cy));
        commands.push(step_delay(CLICK_DELAY_MS, rng));
        if element.element_type == ElementType::Textfield {
            if let Some(text) = element.text.as_deref().filter(|t| !t.is_empty()) {
                commands.push(Command::text(text));
                commands.push(step_delay(TYPE_DELAY_MS, rng));
            }
        }
    }
    CommandSequence::new(commands)
}

fn step_delay<R: Rng>((low, high): (u64, u64), rng: &mut R) -> Command {
    Command::delay(rng.gen_range(low..=high))
}
