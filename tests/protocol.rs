// tests/protocol.rs

use proptest::prelude::*;
use zpsexec::exec::protocol::{BEGIN_SENTINEL, END_SENTINEL, FrameParser, LineEvent, ProtocolError};
use zpsexec::reaction::Reaction;

fn feed_all(parser: &mut FrameParser, lines: &[&str]) -> Vec<Reaction> {
    let mut reactions = Vec::new();
    for line in lines {
        if let LineEvent::Reaction(r) = parser.feed(line).unwrap() {
            reactions.push(r);
        }
    }
    reactions
}

#[test]
fn plain_lines_pass_through_verbatim() {
    let mut parser = FrameParser::new();
    assert_eq!(parser.feed("hello world").unwrap(), LineEvent::Plain("hello world"));
    assert_eq!(parser.feed("").unwrap(), LineEvent::Plain(""));
    assert_eq!(parser.feed("windows line\r").unwrap(), LineEvent::Plain("windows line"));
    parser.finish().unwrap();
}

#[test]
fn framed_error_reaction_is_decoded() {
    let mut parser = FrameParser::new();
    assert_eq!(parser.feed(BEGIN_SENTINEL).unwrap(), LineEvent::Begin);
    assert!(parser.in_frame());
    assert_eq!(parser.feed(r#"{"error": {"className": "IOError","#).unwrap(), LineEvent::Buffered);
    assert_eq!(
        parser.feed(r#""message": "disk full", "lineNumber": 40, "phase": "execute", "skipped": true}}"#).unwrap(),
        LineEvent::Buffered
    );

    match parser.feed(END_SENTINEL).unwrap() {
        LineEvent::Reaction(Reaction::Error(err)) => {
            assert_eq!(err.class_name, "IOError");
            assert_eq!(err.message, "disk full");
            assert_eq!(err.line_number, 40);
            assert_eq!(err.phase, "execute");
            assert!(err.skipped);
        }
        other => panic!("expected error reaction, got {other:?}"),
    }
    assert!(!parser.in_frame());
    parser.finish().unwrap();
}

#[test]
fn sentinels_match_by_prefix() {
    let mut parser = FrameParser::new();
    let begin = format!("{BEGIN_SENTINEL} 2024-01-01");
    let end = format!("{END_SENTINEL} trailing");
    let reactions = feed_all(
        &mut parser,
        &[&begin, r#"{"nextProcess": {"execute": [{"language": "java"}]}}"#, &end],
    );
    assert_eq!(reactions.len(), 1);
    assert!(matches!(&reactions[0], Reaction::NextProcess(s) if s.execute[0].language == "java"));
}

#[test]
fn end_sentinel_outside_a_frame_is_plain() {
    let mut parser = FrameParser::new();
    assert_eq!(parser.feed(END_SENTINEL).unwrap(), LineEvent::Plain(END_SENTINEL));
}

#[test]
fn malformed_frame_is_an_error() {
    let mut parser = FrameParser::new();
    parser.feed(BEGIN_SENTINEL).unwrap();
    parser.feed("{ this is not json").unwrap();
    match parser.feed(END_SENTINEL) {
        Err(ProtocolError::Malformed { payload, .. }) => assert_eq!(payload, "{ this is not json"),
        other => panic!("expected Malformed, got {other:?}"),
    }
}

#[test]
fn unknown_reaction_shape_is_malformed() {
    let mut parser = FrameParser::new();
    parser.feed(BEGIN_SENTINEL).unwrap();
    parser.feed(r#"{"progress": 50}"#).unwrap();
    assert!(matches!(parser.feed(END_SENTINEL), Err(ProtocolError::Malformed { .. })));
}

#[test]
fn unterminated_frame_fails_at_end_of_stream() {
    let mut parser = FrameParser::new();
    parser.feed(BEGIN_SENTINEL).unwrap();
    parser.feed(r#"{"error": {}}"#).unwrap();
    match parser.finish() {
        Err(ProtocolError::Unterminated { buffered }) => assert_eq!(buffered, 1),
        other => panic!("expected Unterminated, got {other:?}"),
    }
}

#[test]
fn empty_stream_yields_no_reactions() {
    let mut parser = FrameParser::new();
    assert!(feed_all(&mut parser, &[]).is_empty());
    parser.finish().unwrap();
}

proptest! {
    // Lines that never start with a sentinel are always passed through as-is.
    #[test]
    fn non_sentinel_lines_are_plain(lines in proptest::collection::vec("[^#\r\n][^\r\n]{0,40}", 0..30)) {
        let mut parser = FrameParser::new();
        for line in &lines {
            prop_assert_eq!(parser.feed(line).unwrap(), LineEvent::Plain(line.as_str()));
        }
        prop_assert!(parser.finish().is_ok());
    }

    // K frames interleaved with noise decode to exactly K reactions, in order.
    #[test]
    fn k_frames_yield_k_reactions(
        messages in proptest::collection::vec("[a-z ]{0,20}", 0..8),
        noise in "[a-z0-9 ]{0,20}",
    ) {
        let mut parser = FrameParser::new();
        let mut decoded = Vec::new();
        for msg in &messages {
            let body = serde_json::json!({"error": {"message": msg}}).to_string();
            for line in [noise.as_str(), BEGIN_SENTINEL, body.as_str(), END_SENTINEL] {
                if let LineEvent::Reaction(r) = parser.feed(line).unwrap() {
                    decoded.push(r);
                }
            }
        }
        prop_assert!(parser.finish().is_ok());
        prop_assert_eq!(decoded.len(), messages.len());
        for (reaction, msg) in decoded.iter().zip(&messages) {
            prop_assert_eq!(&reaction.as_error().unwrap().message, msg);
        }
    }
}
