//! Line-oriented interactive scoring loop

use crate::samples::SampleCursor;
use std::io::{self, BufRead, Write};

pub const QUIT_COMMAND: &str = ":quit";
pub const NEXT_SAMPLE_COMMAND: &str = ":next";

const BANNER: &str = "Enter comments, one per line. An empty line scores them.\n\
                      :next loads a sample comment, :quit exits.";

/// Drive the interactive session until `:quit` or end of input.
///
/// Lines accumulate into a pending request; an empty line hands the request
/// to `submit` and writes back whatever it returns. `:next` replaces the
/// pending request with the next sample from `cursor`. Pending lines are
/// submitted at end of input.
pub fn run<R, W, F>(
    input: R,
    output: &mut W,
    cursor: &mut SampleCursor<'_>,
    mut submit: F,
) -> io::Result<()>
where
    R: BufRead,
    W: Write,
    F: FnMut(&str) -> String,
{
    writeln!(output, "{}", BANNER)?;
    let mut pending: Vec<String> = Vec::new();

    for line in input.lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed == QUIT_COMMAND {
            return Ok(());
        }

        if trimmed == NEXT_SAMPLE_COMMAND {
            pending.clear();
            if let Some(sample) = cursor.next() {
                writeln!(output, "sample> {}", sample)?;
                pending.push(sample.to_string());
            }
            continue;
        }

        if trimmed.is_empty() {
            write!(output, "{}", submit(&pending.join("\n")))?;
            output.flush()?;
            pending.clear();
            continue;
        }

        pending.push(line);
    }

    if !pending.is_empty() {
        write!(output, "{}", submit(&pending.join("\n")))?;
    }
    output.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::SAMPLE_COMMENTS;
    use std::io::Cursor;

    fn session(script: &str) -> (String, Vec<String>) {
        let mut submitted = Vec::new();
        let mut output = Vec::new();
        let mut cursor = SampleCursor::default();

        run(Cursor::new(script), &mut output, &mut cursor, |text| {
            submitted.push(text.to_string());
            format!("scored {} line(s)\n", text.lines().count())
        })
        .unwrap();

        (String::from_utf8(output).unwrap(), submitted)
    }

    #[test]
    fn test_empty_line_submits_accumulated_lines() {
        let (output, submitted) = session("first\nsecond\n\nthird\n\n:quit\n");
        assert_eq!(submitted, vec!["first\nsecond", "third"]);
        assert!(output.contains("scored 2 line(s)"));
    }

    #[test]
    fn test_next_replaces_pending_with_sample() {
        let (output, submitted) = session("draft\n:next\n:next\n\n");
        assert_eq!(submitted, vec![SAMPLE_COMMENTS[1]]);
        assert!(output.contains(&format!("sample> {}", SAMPLE_COMMENTS[0])));
    }

    #[test]
    fn test_quit_discards_pending() {
        let (_, submitted) = session("pending\n:quit\nafter\n\n");
        assert!(submitted.is_empty());
    }

    #[test]
    fn test_end_of_input_submits_pending() {
        let (_, submitted) = session("last words");
        assert_eq!(submitted, vec!["last words"]);
    }

    #[test]
    fn test_blank_submit_is_passed_through() {
        let (_, submitted) = session("\n:quit\n");
        assert_eq!(submitted, vec![""]);
    }
}
