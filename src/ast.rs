/// Parsed sequence diagram: participants in declaration/first-use order
/// and messages in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceDiagram {
    pub participants: Vec<Participant>,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: String,
    /// Display label: the `as` alias when given, otherwise the id.
    pub label: String,
    /// Position on the horizontal axis, left to right.
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Index of the sending participant.
    pub from: usize,
    /// Index of the receiving participant.
    pub to: usize,
    pub label: String,
    pub kind: ArrowKind,
    /// 1-based sequence number, present when `autonumber` is active.
    pub number: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowKind {
    /// `->>`
    Solid,
    /// `-->>`
    Dotted,
}
