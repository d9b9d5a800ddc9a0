/// Blank-line boundary between pages/blocks of extracted text.
pub const SEGMENT_BREAK: &str = "\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    /// 1-based position, reported as the page number.
    pub index: usize,
    pub text: &'a str,
}

impl<'a> Segment<'a> {
    /// 1-based line of a byte offset inside this segment.
    pub fn line_of(&self, offset: usize) -> usize {
        self.text[..offset].matches('\n').count() + 1
    }
}

/// Lazy segment iterator. Cloning restarts from the clone point.
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    rest: Option<&'a str>,
    index: usize,
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Segment<'a>> {
        let rest = self.rest?;
        self.index += 1;
        match rest.find(SEGMENT_BREAK) {
            Some(pos) => {
                self.rest = Some(&rest[pos + SEGMENT_BREAK.len()..]);
                Some(Segment { index: self.index, text: &rest[..pos] })
            }
            None => {
                self.rest = None;
                Some(Segment { index: self.index, text: rest })
            }
        }
    }
}

/// Split text on double line breaks. Empty input yields no segments; empty
/// chunks between consecutive breaks keep their index.
pub fn segments(text: &str) -> Segments<'_> {
    Segments { rest: if text.is_empty() { None } else { Some(text) }, index: 0 }
}
