use log::debug;
use winnow::ascii::{space0, space1};
use winnow::combinator::{alt, eof, opt, preceded};
use winnow::prelude::*;
use winnow::token::{rest, take_while};

use crate::RenderError;
use crate::ast::*;
use crate::logical_lines;

#[derive(Debug, PartialEq, Eq)]
enum Statement {
    Autonumber,
    Participant { id: String, alias: Option<String> },
    Message {
        from: String,
        to: String,
        kind: ArrowKind,
        label: String,
    },
}

pub fn parse_sequence(input: &str) -> Result<SequenceDiagram, RenderError> {
    let mut lines = Vec::new();
    for raw in logical_lines(input) {
        let without_comment = match raw.find("%%") {
            Some(i) => &raw[..i],
            None => raw,
        };
        let line = without_comment.trim();
        if !line.is_empty() {
            lines.push(line);
        }
    }

    let Some((&header_line, body)) = lines.split_first() else {
        return Err(RenderError::Parse("missing sequenceDiagram header".to_string()));
    };
    if header_line != "sequenceDiagram" {
        return Err(RenderError::Parse(format!(
            "expected sequenceDiagram header, got `{header_line}`"
        )));
    }

    let mut diagram = SequenceDiagram {
        participants: Vec::new(),
        messages: Vec::new(),
    };
    let mut autonumber = false;
    let mut next_number = 0;

    for &line in body {
        debug!("parsing line: {line}");
        let stmt = statement
            .parse(line)
            .map_err(|_| RenderError::Parse(format!("could not parse line: `{line}`")))?;
        match stmt {
            Statement::Autonumber => autonumber = true,
            Statement::Participant { id, alias } => {
                if diagram.participants.iter().any(|p| p.id == id) {
                    return Err(RenderError::Parse(format!("duplicate participant `{id}`")));
                }
                let index = diagram.participants.len();
                let label = alias.unwrap_or_else(|| id.clone());
                diagram.participants.push(Participant { id, label, index });
            }
            Statement::Message { from, to, kind, label } => {
                let from = declare_implicit(&mut diagram.participants, &from);
                let to = declare_implicit(&mut diagram.participants, &to);
                let number = if autonumber {
                    next_number += 1;
                    Some(next_number)
                } else {
                    None
                };
                diagram.messages.push(Message {
                    from,
                    to,
                    label,
                    kind,
                    number,
                });
            }
        }
    }

    debug!(
        "parsed sequence diagram: {} participants, {} messages",
        diagram.participants.len(),
        diagram.messages.len()
    );
    Ok(diagram)
}

/// A message endpoint that was never declared becomes a participant at
/// first use, appended after the existing ones.
fn declare_implicit(participants: &mut Vec<Participant>, id: &str) -> usize {
    if let Some(existing) = participants.iter().position(|p| p.id == id) {
        return existing;
    }
    let index = participants.len();
    participants.push(Participant {
        id: id.to_string(),
        label: id.to_string(),
        index,
    });
    index
}

fn statement(input: &mut &str) -> winnow::Result<Statement> {
    alt((autonumber_stmt, participant_stmt, message_stmt)).parse_next(input)
}

fn autonumber_stmt(input: &mut &str) -> winnow::Result<Statement> {
    ("autonumber", space0, eof).parse_next(input)?;
    Ok(Statement::Autonumber)
}

fn participant_stmt(input: &mut &str) -> winnow::Result<Statement> {
    ("participant", space1).parse_next(input)?;
    let id = ident.parse_next(input)?;
    let alias = opt(preceded((space1, "as", space1), rest)).parse_next(input)?;
    Ok(Statement::Participant {
        id: id.to_string(),
        alias: alias.map(|s: &str| s.trim().to_string()),
    })
}

fn message_stmt(input: &mut &str) -> winnow::Result<Statement> {
    let from = ident.parse_next(input)?;
    space0.parse_next(input)?;
    let kind = alt((
        "-->>".value(ArrowKind::Dotted),
        "->>".value(ArrowKind::Solid),
    ))
    .parse_next(input)?;
    space0.parse_next(input)?;
    let to = ident.parse_next(input)?;
    space0.parse_next(input)?;
    ':'.parse_next(input)?;
    space0.parse_next(input)?;
    let label: &str = rest.parse_next(input)?;
    Ok(Statement::Message {
        from: from.to_string(),
        to: to.to_string(),
        kind,
        label: label.trim().to_string(),
    })
}

fn ident<'s>(input: &mut &'s str) -> winnow::Result<&'s str> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_').parse_next(input)
}
