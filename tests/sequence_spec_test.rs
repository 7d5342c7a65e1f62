use mda::{RenderConfig, RenderError, try_render};
use pretty_assertions::assert_eq;

fn render(input: &str) -> String {
    try_render(input, &RenderConfig::default()).unwrap()
}

#[test]
fn three_participants_two_solid_one_dotted() {
    let input = "\
sequenceDiagram
    Alice->>Bob: Step 1
    Bob->>Charlie: Step 2
    Charlie-->>Alice: Done
";
    let output = render(input);

    for header in ["Alice", "Bob", "Charlie"] {
        assert_eq!(
            output.matches(header).count(),
            1,
            "{header} appears once as a header:\n{output}"
        );
    }
    assert!(output.contains("Step 1"));
    assert!(output.contains("Step 2"));
    assert!(output.contains("Done"));

    // two left-to-right solid arrows, one right-to-left dotted reply
    assert_eq!(output.matches('>').count(), 2);
    assert_eq!(output.matches('<').count(), 1);
    let reply = output.lines().find(|l| l.contains('<')).unwrap();
    assert!(reply.contains('╌'), "reply must be dotted: {reply:?}");
}

#[test]
fn lifelines_run_from_header_to_bottom() {
    let output = render("sequenceDiagram\n    Alice->>Bob: Hello\n");
    for line in output.lines().skip(3) {
        assert_eq!(line.matches('│').count(), 2, "two lifelines per row: {line:?}");
    }
}

#[test]
fn message_label_sits_above_its_connector() {
    let output = render("sequenceDiagram\n    Alice->>Bob: Hello\n");
    let lines: Vec<&str> = output.lines().collect();
    let label_row = lines.iter().position(|l| l.contains("Hello")).unwrap();
    assert!(lines[label_row + 1].contains('>'));
}

#[test]
fn self_message_uses_right_angle_loop() {
    let output = render("sequenceDiagram\n    A->>B: ask\n    B->>B: ponder\n");
    let lines: Vec<&str> = output.lines().collect();
    let label_row = lines.iter().position(|l| l.contains("ponder")).unwrap();
    assert!(lines[label_row + 1].ends_with('┐'));
    assert!(lines[label_row + 2].ends_with('┘'));
    assert!(lines[label_row + 2].contains('<'));
}

#[test]
fn autonumber_prefixes_messages_in_order() {
    let input = "\
sequenceDiagram
    autonumber
    A->>B: first
    B->>B: second
    B-->>A: third
";
    let output = render(input);
    assert!(output.contains("1. first"));
    assert!(output.contains("2. second"));
    assert!(output.contains("3. third"));
}

#[test]
fn participant_alias_is_the_rendered_label() {
    let input = "\
sequenceDiagram
    participant A as Auth Service
    participant B
    A->>B: token
";
    let output = render(input);
    assert!(output.contains("Auth Service"));
    assert!(!output.contains("│ A │"), "the id is replaced by its alias:\n{output}");
}

#[test]
fn duplicate_participant_declines() {
    let input = "\
sequenceDiagram
    participant A
    participant A
    A->>A: hi
";
    let err = try_render(input, &RenderConfig::default()).unwrap_err();
    assert!(matches!(err, RenderError::Parse(_)));
    assert_eq!(mda::render(input, &RenderConfig::default()), None);
}

#[test]
fn ascii_mode_uses_plain_glyphs_only() {
    let config = RenderConfig {
        use_ascii: true,
        ..RenderConfig::default()
    };
    let input = "\
sequenceDiagram
    Alice->>Bob: Hello
    Bob-->>Alice: Hi!
    Bob->>Bob: note to self
";
    let output = try_render(input, &config).unwrap();
    for ch in output.chars() {
        assert!(
            matches!(ch, '+' | '-' | '|' | '>' | '<' | '.' | '\n' | ' ' | '!')
                || ch.is_alphanumeric(),
            "unexpected glyph {ch:?}:\n{output}"
        );
    }
}

#[test]
fn participant_spacing_is_configurable() {
    let roomy = RenderConfig {
        seq_participant_spacing: 30,
        ..RenderConfig::default()
    };
    let input = "sequenceDiagram\n    A->>B: hi\n";
    let default_width = render(input).lines().map(str::len).max().unwrap();
    let roomy_width = try_render(input, &roomy)
        .unwrap()
        .lines()
        .map(str::len)
        .max()
        .unwrap();
    assert!(roomy_width > default_width);
}

#[test]
fn self_message_width_below_two_is_a_config_error() {
    let config = RenderConfig {
        seq_self_message_width: 1,
        ..RenderConfig::default()
    };
    let err = try_render("sequenceDiagram\n    A->>A: x\n", &config).unwrap_err();
    assert!(matches!(err, RenderError::Config(_)));
}
