/// Builds a page window such as `1 2 … 5 6 [7] 8 9 10 11 … 19 20`, where
/// `None` marks a gap.
fn get_pages(
    total_pages: usize,
    current_page: usize,
    left_edge: usize,
    left_current: usize,
    right_current: usize,
    right_edge: usize,
) -> Vec<Option<usize>> {
    let last_page = total_pages;

    if last_page == 0 {
        return vec![];
    }

    let mut pages = Vec::new();

    let left_end = (1 + left_edge).min(last_page + 1);
    pages.extend((1..left_end).map(Some));

    let mid_start = left_end.max(current_page.saturating_sub(left_current));
    let mid_end = (current_page + right_current + 1).min(last_page + 1);

    if mid_start > left_end {
        pages.push(None);
    }
    pages.extend((mid_start..mid_end).map(Some));

    let right_start = mid_end.max(last_page.saturating_sub(right_edge) + 1);

    if right_start > mid_end {
        pages.push(None);
    }
    pages.extend((right_start..=last_page).map(Some));

    pages
}

/// Page links shown under an order list.
pub fn page_window(total_pages: usize, current_page: usize) -> Vec<Option<usize>> {
    let current_page = current_page.clamp(1, total_pages.max(1));
    get_pages(total_pages, current_page, 2, 2, 4, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_past_the_end_does_not_overflow() {
        assert_eq!(page_window(2, usize::MAX), vec![Some(1), Some(2)]);
    }

    #[test]
    fn no_pages_for_empty_result() {
        assert!(page_window(0, 1).is_empty());
    }

    #[test]
    fn short_lists_have_no_gaps() {
        assert_eq!(page_window(3, 2), vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn long_lists_collapse_both_sides() {
        assert_eq!(
            page_window(20, 10),
            vec![
                Some(1),
                Some(2),
                None,
                Some(8),
                Some(9),
                Some(10),
                Some(11),
                Some(12),
                Some(13),
                Some(14),
                None,
                Some(19),
                Some(20),
            ]
        );
    }

    #[test]
    fn zero_current_page_is_treated_as_first() {
        assert_eq!(page_window(2, 0), vec![Some(1), Some(2)]);
    }
}
