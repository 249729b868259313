use graft::{ErrorCategory, ErrorKind, JsonReader, JsonTape, Token, TokenStream};

#[test]
fn reader_and_tape_agree() {
    let data = r#"
        // leading comment
        {
            unquoted: 'single',
            "date": "\/Date(0)\/",
            "ctor": new Thing(1, "two"),
            "list": [1, 2.5, -3, true, null, undefined, NaN, -Infinity,],
        }
    "#;

    let tape = JsonTape::from_str(data).unwrap();
    let mut reader = JsonReader::new(data);
    let mut streamed = Vec::new();
    while reader.advance().unwrap() {
        streamed.push(reader.token().clone());
    }

    assert_eq!(tape.tokens(), streamed.as_slice());
    assert_eq!(streamed[0], Token::Comment(String::from(" leading comment")));
    assert_eq!(streamed[2], Token::PropertyName(String::from("unquoted")));
    assert_eq!(streamed[7], Token::StartConstructor(String::from("Thing")));
}

#[test]
fn parse_errors_carry_offset() {
    let err = JsonTape::from_str(r#"{"a" 1}"#).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Structural);
    assert!(matches!(err.kind(), ErrorKind::Parse { offset: 5, .. }));
}

#[test]
fn tape_reuse() {
    let mut tape = JsonTape::default();
    JsonTape::parser().parse_str_into_tape("[1, 2, 3]", &mut tape).unwrap();
    assert_eq!(tape.tokens().len(), 5);
    JsonTape::parser().parse_str_into_tape("{}", &mut tape).unwrap();
    assert_eq!(tape.tokens(), &[Token::StartObject, Token::EndObject]);
}

#[test]
fn tape_streams_track_depth() {
    let tape = JsonTape::from_str(r#"{"a": [1]}"#).unwrap();
    let mut stream = tape.stream();
    let mut depths = Vec::new();
    while stream.advance().unwrap() {
        depths.push(stream.depth());
    }
    assert_eq!(depths, vec![0, 1, 1, 2, 1, 0]);
}
