use log::debug;

use crate::RenderError;
use crate::ast::*;
use crate::config::RenderConfig;
use crate::display_width::display_width;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqLayout {
    pub participants: Vec<ParticipantLayout>,
    pub rows: Vec<MessageRow>,
    pub total_width: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantLayout {
    pub label: String,
    pub center: usize,
    pub box_left: usize,
    pub box_right: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRow {
    pub from: usize,
    pub to: usize,
    /// Label text, already carrying the autonumber prefix.
    pub text: String,
    pub kind: ArrowKind,
}

impl MessageRow {
    pub fn is_self_message(&self) -> bool {
        self.from == self.to
    }
}

/// Columns between a participant center and the start of a message label.
const LABEL_INSET: usize = 2;
/// Room for the arrowhead and one column of clearance.
const ARROW_DECORATION_WIDTH: usize = 2;

pub fn compute(diagram: &SequenceDiagram, config: &RenderConfig) -> Result<SeqLayout, RenderError> {
    if diagram.participants.is_empty() {
        return Err(RenderError::Parse("no participants found".to_string()));
    }

    let rows: Vec<MessageRow> = diagram
        .messages
        .iter()
        .map(|m| MessageRow {
            from: m.from,
            to: m.to,
            text: match m.number {
                Some(n) => format!("{n}. {}", m.label),
                None => m.label.clone(),
            },
            kind: m.kind,
        })
        .collect();

    let (gaps, extra_right) = compute_gaps(diagram, &rows, config);
    let participants = compute_positions(&diagram.participants, &gaps);

    let mut total_width = participants.last().map(|p| p.box_right + 1).unwrap_or(0);
    if let Some(last) = participants.last() {
        total_width = total_width.max(last.center + extra_right + 1);
    }

    debug!(
        "sequence layout: {} participants over {total_width} columns",
        participants.len()
    );
    Ok(SeqLayout {
        participants,
        rows,
        total_width,
    })
}

/// Gap between neighboring centers: the configured floor, what the two
/// header boxes need, and each spanned gap's share of every message line
/// that crosses it. Self-messages push the right boundary instead.
fn compute_gaps(
    diagram: &SequenceDiagram,
    rows: &[MessageRow],
    config: &RenderConfig,
) -> (Vec<usize>, usize) {
    let count = diagram.participants.len();
    let mut gaps = vec![config.seq_participant_spacing; count.saturating_sub(1)];
    let mut extra_right = 0;

    for row in rows {
        let text_width = display_width(&row.text);
        if row.is_self_message() {
            let need = config
                .seq_self_message_width
                .max(LABEL_INSET + text_width)
                + ARROW_DECORATION_WIDTH;
            if row.from + 1 < count {
                gaps[row.from] = gaps[row.from].max(need);
            } else {
                extra_right = extra_right.max(need);
            }
            continue;
        }
        let (left, right) = if row.from < row.to {
            (row.from, row.to)
        } else {
            (row.to, row.from)
        };
        let span = right - left;
        let required = text_width + LABEL_INSET + ARROW_DECORATION_WIDTH;
        let per_gap = required.div_ceil(span);
        for gap in &mut gaps[left..right] {
            *gap = (*gap).max(per_gap);
        }
    }

    for i in 0..count.saturating_sub(1) {
        let left_label = &diagram.participants[i].label;
        let right_label = &diagram.participants[i + 1].label;
        let left_half = display_width(left_label) / 2 + 2;
        let right_half = display_width(right_label) / 2 + 2;
        gaps[i] = gaps[i].max(left_half + right_half + 2);
    }

    (gaps, extra_right)
}

fn compute_positions(participants: &[Participant], gaps: &[usize]) -> Vec<ParticipantLayout> {
    let mut layouts: Vec<ParticipantLayout> = Vec::with_capacity(participants.len());

    for (i, participant) in participants.iter().enumerate() {
        let box_width = display_width(&participant.label) + 4;
        let center = match i {
            0 => box_width / 2,
            _ => layouts[i - 1].center + gaps[i - 1],
        };
        layouts.push(ParticipantLayout {
            label: participant.label.clone(),
            center,
            box_left: center - box_width / 2,
            box_right: center + (box_width - 1) / 2,
        });
    }

    layouts
}
