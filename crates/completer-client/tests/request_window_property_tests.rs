//! Context window properties of autocomplete requests built from a buffer

use completer_client::{AutocompleteRequest, CONTEXT_CHAR_LIMIT};
use proptest::prelude::*;

/// Buffers built from a short unit repeated up to well past the window size
fn buffer() -> impl Strategy<Value = String> {
    ("[a-zé😀\n ]{1,6}", 0usize..70_000).prop_map(|(unit, n)| unit.repeat(n))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_window_is_contiguous_and_bounded(text in buffer(), pick in any::<prop::sample::Index>()) {
        let offset = pick.index(text.len() + 8);
        let req = AutocompleteRequest::from_buffer("buf", &text, offset);

        prop_assert!(req.before.chars().count() <= CONTEXT_CHAR_LIMIT);
        prop_assert!(req.after.chars().count() <= CONTEXT_CHAR_LIMIT);

        let window = format!("{}{}", req.before, req.after);
        prop_assert!(text.contains(&window));

        // the cursor sits on the char boundary at or below the requested offset
        let mut snapped = offset.min(text.len());
        while !text.is_char_boundary(snapped) {
            snapped -= 1;
        }
        prop_assert!(text[..snapped].ends_with(&req.before));
        prop_assert!(text[snapped..].starts_with(&req.after));
    }

    #[test]
    fn prop_region_flags_match_window_edges(text in buffer(), pick in any::<prop::sample::Index>()) {
        let offset = pick.index(text.len() + 1);
        let req = AutocompleteRequest::from_buffer("buf", &text, offset);

        let mut snapped = offset.min(text.len());
        while !text.is_char_boundary(snapped) {
            snapped -= 1;
        }
        prop_assert_eq!(req.region_includes_beginning, req.before.len() == snapped);
        prop_assert_eq!(
            req.region_includes_end,
            text[snapped..].chars().count() < CONTEXT_CHAR_LIMIT
        );
        if req.region_includes_end {
            prop_assert_eq!(snapped + req.after.len(), text.len());
        }
    }
}
