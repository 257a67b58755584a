//! Paging and share formatting for printed schedules.

pub const ROWS_PER_PAGE_OPTIONS: [usize; 4] = [5, 10, 25, 50];
pub const DEFAULT_ROWS_PER_PAGE: usize = 10;

/// Items on 0-based `page`. Pages past the end are empty.
pub fn paginate<T>(items: &[T], page: usize, rows_per_page: usize) -> &[T] {
    if rows_per_page == 0 {
        return &[];
    }
    let start = page.saturating_mul(rows_per_page);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(rows_per_page).min(items.len());
    &items[start..end]
}

pub fn page_count(len: usize, rows_per_page: usize) -> usize {
    if rows_per_page == 0 {
        0
    } else {
        len.div_ceil(rows_per_page)
    }
}

/// Share in [0, 1] as a percentage, e.g. `0.18765` -> `"18.77%"`.
pub fn format_share(share: f64) -> String {
    format!("{:.2}%", share * 100.)
}
