//! Built-in sample comments and a cursor for cycling through them

pub const SAMPLE_COMMENTS: &[&str] = &[
    "I think you're completely wrong, this is nonsense!",
    "Here's a link to the source: http://abc.com",
    "I love this subreddit, thanks for all the work!",
    "You are the worst, get lost!",
    "fuck you",
];

/// Position in a sample list, owned by the caller.
///
/// Iterating hands out the current sample and advances, wrapping at the
/// end, so the iterator never ends unless the list is empty.
#[derive(Debug, Clone)]
pub struct SampleCursor<'a> {
    samples: &'a [&'a str],
    index: usize,
}

impl<'a> SampleCursor<'a> {
    pub fn new(samples: &'a [&'a str]) -> Self {
        Self { samples, index: 0 }
    }

    /// Index of the sample the next call returns
    pub fn position(&self) -> usize {
        self.index
    }
}

impl<'a> Iterator for SampleCursor<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.samples.is_empty() {
            return None;
        }
        let sample = self.samples[self.index];
        self.index = (self.index + 1) % self.samples.len();
        Some(sample)
    }
}

impl Default for SampleCursor<'static> {
    fn default() -> Self {
        Self::new(SAMPLE_COMMENTS)
    }
}
