use anyhow::{anyhow, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRef {
    Number(u32),
    End,
}

/// One split request on the command line: `5`, `1-5` or `5-end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRange {
    pub start: PageRef,
    pub end: Option<PageRef>,
}

impl PageRange {
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow!("Empty page range"));
        }

        if let Some(dash_pos) = s.find('-') {
            // "-5" is not a range
            if dash_pos == 0 {
                return Err(anyhow!("Invalid page range: {}", s));
            }

            let start = parse_page_ref(&s[..dash_pos])?;
            let end = parse_page_ref(&s[dash_pos + 1..])?;
            Ok(PageRange {
                start,
                end: Some(end),
            })
        } else {
            Ok(PageRange {
                start: parse_page_ref(s)?,
                end: None,
            })
        }
    }

    /// Resolve `end` against the document and return the range as typed page numbers.
    ///
    /// Bounds are not checked here; the selection controller validates them.
    pub fn resolve(&self, total_pages: u32) -> (u32, u32) {
        let start = match &self.start {
            PageRef::Number(n) => *n,
            PageRef::End => total_pages,
        };

        let end = match &self.end {
            Some(PageRef::Number(n)) => *n,
            Some(PageRef::End) => total_pages,
            None => start,
        };

        (start, end)
    }
}

fn parse_page_ref(s: &str) -> Result<PageRef> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("end") {
        Ok(PageRef::End)
    } else {
        s.parse::<u32>()
            .map(PageRef::Number)
            .map_err(|_| anyhow!("Invalid page number: {}", s))
    }
}

/// Parse a comma-separated list of page ranges like "1-5,10,15-end"
pub fn parse_page_ranges(s: &str) -> Result<Vec<PageRange>> {
    s.split(',').map(PageRange::parse).collect()
}
