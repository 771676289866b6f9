//! Property tests: every source-backed byte of a derived string resolves to
//! the same byte in its original.

use proptest::prelude::*;
use quarto_source_map::{MappedString, StringPiece, mapped_concat, mapped_string};

fn pieces_for(len: usize) -> impl Strategy<Value = Vec<StringPiece>> {
    let range = (0..=len, 0..=len).prop_map(|(a, b)| {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        StringPiece::Range((start..end).into())
    });
    let text = "[ ,;#-]{0,3}".prop_map(StringPiece::Text);
    prop::collection::vec(prop_oneof![3 => range, 1 => text], 0..6)
}

fn assert_round_trip(derived: &MappedString) {
    for i in 0..derived.len() {
        if let Some(loc) = derived.map(i, false) {
            let original = loc.original.value().as_bytes();
            assert_eq!(original[loc.index], derived.value().as_bytes()[i], "offset {i}");
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn sliced_strings_round_trip(
        (text, pieces) in "[a-z0-9:\n ]{0,40}".prop_flat_map(|t| {
            let len = t.len();
            (Just(t), pieces_for(len))
        })
    ) {
        let original = MappedString::original(text, None);
        let derived = mapped_string(&original, pieces).unwrap();
        assert_round_trip(&derived);
    }

    #[test]
    fn nested_and_concatenated_strings_round_trip(
        text in "[a-z\n]{10,40}",
        cut in 0usize..10,
    ) {
        let original = MappedString::original(text.clone(), None);
        let head = original.substring(0, cut).unwrap();
        let tail = original.substring(cut, text.len()).unwrap();
        let swapped = mapped_concat(vec![tail, head]);
        let again = mapped_string(&swapped, vec![(0..swapped.len()).into(), "\n".into()]).unwrap();
        assert_round_trip(&swapped);
        assert_round_trip(&again);
        prop_assert_eq!(again.len(), text.len() + 1);
    }

    #[test]
    fn closest_always_resolves_when_anything_is_mapped(text in "[a-z]{1,20}", gap in "[-]{1,4}") {
        let original = MappedString::original(text.clone(), None);
        let derived = mapped_string(&original, vec![gap.into(), (0..text.len()).into()]).unwrap();
        for i in 0..=derived.len() {
            prop_assert!(derived.map(i, true).is_some());
        }
    }
}
