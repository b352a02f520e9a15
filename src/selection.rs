//! Page-range selection state machine.
//!
//! Each of the two page fields keeps the text the user is typing separately from the committed
//! page number. Text is committed only when it parses to a page that satisfies
//! `1 <= from <= to <= page_count`; otherwise the raw text is held and, for out-of-bounds
//! numbers, an [`InputError`] is raised. Leaving a field with invalid text reverts it to the
//! committed value.

use crate::error::InputError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub from_page: u32,
    pub to_page: u32,
}

impl Selection {
    pub fn page_count(&self) -> u32 {
        self.to_page + 1 - self.from_page
    }
}

/// Result of a typed edit that did not raise an [`InputError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Committed,
    /// The text is not a number yet; it is held without committing.
    Pending,
}

#[derive(Debug, Clone)]
struct PageField {
    committed: u32,
    text: String,
}

impl PageField {
    fn new(page: u32) -> Self {
        PageField {
            committed: page,
            text: page.to_string(),
        }
    }

    fn sync_text(&mut self) {
        self.text = self.committed.to_string();
    }
}

#[derive(Debug, Clone)]
pub struct SelectionController {
    page_count: u32,
    from: PageField,
    to: PageField,
    input_error: Option<InputError>,
    preview_page: u32,
}

impl Default for SelectionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionController {
    /// An empty controller: no pages, selection `{1, 1}`.
    pub fn new() -> Self {
        SelectionController {
            page_count: 0,
            from: PageField::new(1),
            to: PageField::new(1),
            input_error: None,
            preview_page: 1,
        }
    }

    /// Select the whole of a freshly loaded document.
    pub fn reset_for(&mut self, page_count: u32) {
        *self = Self::new();
        self.page_count = page_count;
        self.to = PageField::new(page_count.max(1));
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn selection(&self) -> Selection {
        Selection {
            from_page: self.from.committed,
            to_page: self.to.committed,
        }
    }

    pub fn from_text(&self) -> &str {
        &self.from.text
    }

    pub fn to_text(&self) -> &str {
        &self.to.text
    }

    pub fn input_error(&self) -> Option<InputError> {
        self.input_error
    }

    pub fn preview_page(&self) -> u32 {
        self.preview_page
    }

    /// Fragment addressing the preview page in a PDF viewer.
    pub fn preview_target(&self) -> String {
        format!("#page={}", self.preview_page)
    }

    /// Typed input into the from-page field.
    pub fn input_from(&mut self, text: &str) -> Result<EditOutcome, InputError> {
        self.input_error = None;
        self.from.text = text.to_string();

        let Some(page) = parse_page_number(text) else {
            return Ok(EditOutcome::Pending);
        };
        if page < 1 {
            return Err(self.raise(InputError::FromBelowOne));
        }
        if page > i64::from(self.page_count) {
            return Err(self.raise(InputError::FromExceedsTotal));
        }

        self.commit_from(page as u32);
        Ok(EditOutcome::Committed)
    }

    /// Typed input into the to-page field.
    pub fn input_to(&mut self, text: &str) -> Result<EditOutcome, InputError> {
        self.input_error = None;
        self.to.text = text.to_string();

        let Some(page) = parse_page_number(text) else {
            return Ok(EditOutcome::Pending);
        };
        if page < i64::from(self.from.committed) {
            return Err(self.raise(InputError::ToBelowFrom));
        }
        if page > i64::from(self.page_count) {
            return Err(self.raise(InputError::ToExceedsTotal));
        }

        self.commit_to(page as u32);
        Ok(EditOutcome::Committed)
    }

    /// Range-control drag of the from page. The control's domain is `[1, page_count]`.
    pub fn slide_from(&mut self, page: u32) {
        if self.page_count == 0 {
            return;
        }
        self.input_error = None;
        self.commit_from(page.clamp(1, self.page_count));
    }

    /// Range-control drag of the to page. The control's domain is `[from_page, page_count]`.
    pub fn slide_to(&mut self, page: u32) {
        if self.page_count == 0 {
            return;
        }
        self.input_error = None;
        self.commit_to(page.clamp(self.from.committed, self.page_count));
    }

    /// The from-page field lost focus.
    pub fn blur_from(&mut self) {
        let valid = parse_page_number(&self.from.text)
            .is_some_and(|page| page >= 1 && page <= i64::from(self.page_count));
        if !valid {
            self.from.sync_text();
            self.input_error = None;
        }
    }

    /// The to-page field lost focus.
    pub fn blur_to(&mut self) {
        let valid = parse_page_number(&self.to.text).is_some_and(|page| {
            page >= i64::from(self.from.committed) && page <= i64::from(self.page_count)
        });
        if !valid {
            self.to.sync_text();
            self.input_error = None;
        }
    }

    pub fn next_preview_page(&mut self) -> u32 {
        if self.preview_page < self.page_count {
            self.preview_page += 1;
        }
        self.preview_page
    }

    pub fn prev_preview_page(&mut self) -> u32 {
        if self.preview_page > 1 {
            self.preview_page -= 1;
        }
        self.preview_page
    }

    fn raise(&mut self, error: InputError) -> InputError {
        self.input_error = Some(error);
        error
    }

    fn commit_from(&mut self, page: u32) {
        self.from.committed = page;
        if page > self.to.committed {
            self.to.committed = page;
        }
        self.preview_page = page;
        self.sync_texts();
    }

    fn commit_to(&mut self, page: u32) {
        self.to.committed = page;
        self.preview_page = page;
        self.sync_texts();
    }

    fn sync_texts(&mut self) {
        self.from.sync_text();
        self.to.sync_text();
    }
}

/// Leading-integer parse: optional whitespace, optional sign, then at least one digit.
/// Anything after the digits is ignored.
pub fn parse_page_number(text: &str) -> Option<i64> {
    let s = text.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }

    // Saturate absurdly long inputs instead of failing; they are out of range either way.
    let value = rest[..digits_len].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}
