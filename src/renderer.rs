use crate::ast::ArrowKind;
use crate::canvas::Canvas;
use crate::config::RenderConfig;
use crate::layout::{MessageRow, SeqLayout};

/// Participant header box height, including both borders.
const BOX_HEIGHT: i32 = 3;

struct Glyphs {
    top_left: char,
    top_right: char,
    bottom_left: char,
    bottom_right: char,
    horizontal: char,
    vertical: char,
    tee_down: char,
    solid: char,
    dotted: char,
}

fn glyphs(use_ascii: bool) -> Glyphs {
    if use_ascii {
        Glyphs {
            top_left: '+',
            top_right: '+',
            bottom_left: '+',
            bottom_right: '+',
            horizontal: '-',
            vertical: '|',
            tee_down: '+',
            solid: '-',
            dotted: '.',
        }
    } else {
        Glyphs {
            top_left: '┌',
            top_right: '┐',
            bottom_left: '└',
            bottom_right: '┘',
            horizontal: '─',
            vertical: '│',
            tee_down: '┬',
            solid: '─',
            dotted: '╌',
        }
    }
}

/// Draw participant headers, one lifeline per participant, and every
/// message row top to bottom.
pub fn render(layout: &SeqLayout, config: &RenderConfig) -> String {
    let mut canvas = Canvas::new(false);
    let g = glyphs(config.use_ascii);

    for participant in &layout.participants {
        draw_header(&mut canvas, participant, &g);
    }

    let spacing = config.seq_message_spacing as i32;
    let mut y = BOX_HEIGHT;
    for row in &layout.rows {
        let height = row_height(row, spacing);
        for participant in &layout.participants {
            for dy in 0..height {
                canvas.set(participant.center as i32, y + dy, g.vertical);
            }
        }
        if row.is_self_message() {
            draw_self_message(&mut canvas, layout, row, y, config, &g);
        } else {
            draw_message(&mut canvas, layout, row, y, &g);
        }
        y += height;
    }

    canvas.to_text(config.style_type)
}

fn row_height(row: &MessageRow, spacing: i32) -> i32 {
    if row.is_self_message() {
        3 + spacing
    } else {
        2 + spacing
    }
}

fn draw_header(canvas: &mut Canvas, participant: &crate::layout::ParticipantLayout, g: &Glyphs) {
    let left = participant.box_left as i32;
    let right = participant.box_right as i32;

    canvas.set(left, 0, g.top_left);
    for x in (left + 1)..right {
        canvas.set(x, 0, g.horizontal);
    }
    canvas.set(right, 0, g.top_right);

    canvas.set(left, 1, g.vertical);
    canvas.write_str(left + 2, 1, &participant.label);
    canvas.set(right, 1, g.vertical);

    canvas.set(left, 2, g.bottom_left);
    for x in (left + 1)..right {
        canvas.set(x, 2, g.horizontal);
    }
    canvas.set(right, 2, g.bottom_right);
    canvas.set(participant.center as i32, 2, g.tee_down);
}

fn line_char(kind: ArrowKind, g: &Glyphs) -> char {
    match kind {
        ArrowKind::Solid => g.solid,
        ArrowKind::Dotted => g.dotted,
    }
}

/// Cross-participant message: label one row above a horizontal connector
/// with an arrowhead on the destination side. The label starts two
/// columns past the earlier of the two centers.
fn draw_message(canvas: &mut Canvas, layout: &SeqLayout, row: &MessageRow, y: i32, g: &Glyphs) {
    let from_center = layout.participants[row.from].center as i32;
    let to_center = layout.participants[row.to].center as i32;
    let (left, right) = if from_center < to_center {
        (from_center, to_center)
    } else {
        (to_center, from_center)
    };

    canvas.write_str(left + 2, y, &row.text);

    let arrow_y = y + 1;
    let ch = line_char(row.kind, g);
    for x in (left + 1)..right {
        canvas.set(x, arrow_y, ch);
    }
    if to_center > from_center {
        canvas.set(right - 1, arrow_y, '>');
    } else {
        canvas.set(left + 1, arrow_y, '<');
    }
}

/// Self-message: a fixed-width right-angle loop out of and back into the
/// lifeline, label above it.
fn draw_self_message(
    canvas: &mut Canvas,
    layout: &SeqLayout,
    row: &MessageRow,
    y: i32,
    config: &RenderConfig,
    g: &Glyphs,
) {
    let center = layout.participants[row.from].center as i32;
    let arm_end = center + config.seq_self_message_width as i32;
    let ch = line_char(row.kind, g);

    canvas.write_str(center + 2, y, &row.text);

    let out_y = y + 1;
    for x in (center + 1)..arm_end {
        canvas.set(x, out_y, ch);
    }
    canvas.set(arm_end, out_y, g.top_right);

    let back_y = out_y + 1;
    canvas.set(center + 1, back_y, '<');
    for x in (center + 2)..arm_end {
        canvas.set(x, back_y, ch);
    }
    canvas.set(arm_end, back_y, g.bottom_right);
}
