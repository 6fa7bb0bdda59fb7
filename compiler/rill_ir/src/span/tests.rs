use super::*;

#[test]
fn test_span_basic() {
    let span = Span::new(10, 20);
    assert_eq!(span.len(), 10);
    assert!(!span.is_empty());
    assert!(!span.is_dummy());
}

#[test]
fn test_span_dummy() {
    assert!(Span::DUMMY.is_dummy());
    assert!(Span::DUMMY.is_empty());
    assert_eq!(Span::default(), Span::DUMMY);
}

#[test]
fn test_span_merge() {
    let merged = Span::new(10, 20).merge(Span::new(15, 30));
    assert_eq!(merged, Span::new(10, 30));
}

#[test]
fn test_inverted_span_has_zero_len() {
    let span = Span::new(20, 10);
    assert_eq!(span.len(), 0);
    assert!(span.is_empty());
}

#[test]
fn test_span_display() {
    assert_eq!(Span::new(3, 9).to_string(), "3..9");
    assert_eq!(format!("{:?}", Span::new(3, 9)), "3..9");
}

#[test]
fn test_span_size() {
    assert_eq!(std::mem::size_of::<Span>(), 8);
}
