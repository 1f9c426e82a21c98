//! Incremental printing of a streamed assistant reply.
//!
//! Fragments are printed as they arrive, behind a left pad that lines the
//! reply up with the input marker. Once the write head passes the right
//! margin, the next fragment containing a space starts a fresh line. Only the
//! printed output is wrapped; the accumulated text is the exact concatenation
//! of every content fragment.

use crate::api::StreamChunk;
use crate::error::Result;
use futures_util::stream::{Stream, StreamExt};
use std::io::{self, Write};

/// Column the reply starts at, matching the width of the `   >>> ` marker.
pub const START_CURSOR: usize = 7;

/// Distance kept from the right edge before a wrap is forced.
const RIGHT_MARGIN: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    AwaitingFirstChunk,
    Streaming,
    Done,
}

/// Prints one assistant turn and tracks the virtual cursor column.
pub struct StreamRenderer<W: Write> {
    out: W,
    state: RenderState,
    cursor: usize,
    end_cursor: usize,
    text: String,
    fragments: u64,
}

impl<W: Write> StreamRenderer<W> {
    /// Start a turn: print a blank line and the left pad.
    pub fn begin(mut out: W, term_width: usize) -> io::Result<Self> {
        writeln!(out)?;
        write!(out, "{}", " ".repeat(START_CURSOR))?;
        out.flush()?;
        Ok(Self {
            out,
            state: RenderState::AwaitingFirstChunk,
            cursor: START_CURSOR,
            end_cursor: term_width.saturating_sub(RIGHT_MARGIN),
            text: String::new(),
            fragments: 0,
        })
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Content fragments seen so far.
    pub fn fragment_count(&self) -> u64 {
        self.fragments
    }

    pub fn push(&mut self, chunk: StreamChunk) -> io::Result<()> {
        if self.state == RenderState::Done {
            log::warn!("chunk arrived after the turn was finished; ignoring it");
            return Ok(());
        }
        let fragment = match chunk {
            StreamChunk::RoleAnnouncement => return Ok(()),
            StreamChunk::Content(fragment) => fragment,
        };
        self.state = RenderState::Streaming;
        self.text.push_str(&fragment);
        self.fragments += 1;

        let mut printed = fragment.as_str();
        if printed.contains(' ') && self.cursor > self.end_cursor {
            self.line_break()?;
            printed = printed.strip_prefix(' ').unwrap_or(printed);
        }
        self.cursor += printed.chars().count();
        write!(self.out, "{}", printed)?;

        if printed.contains('\n') {
            self.cursor = START_CURSOR;
            write!(self.out, "{}", " ".repeat(START_CURSOR))?;
        }
        self.out.flush()
    }

    /// End the turn and hand back the accumulated reply.
    pub fn finish(&mut self) -> io::Result<String> {
        write!(self.out, "\n\n")?;
        self.out.flush()?;
        self.state = RenderState::Done;
        Ok(std::mem::take(&mut self.text))
    }

    fn line_break(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        write!(self.out, "{}", " ".repeat(START_CURSOR))?;
        self.cursor = START_CURSOR;
        Ok(())
    }
}

/// Drive a chunk stream through `renderer` and return the full reply text.
///
/// A stream error aborts the turn without printing the closing line breaks.
pub async fn render_stream<S, W>(stream: S, renderer: &mut StreamRenderer<W>) -> Result<String>
where
    S: Stream<Item = Result<StreamChunk>>,
    W: Write,
{
    let mut stream = std::pin::pin!(stream);
    while let Some(chunk) = stream.next().await {
        renderer.push(chunk?)?;
    }
    log::debug!("stream ended after {} fragment(s)", renderer.fragment_count());
    Ok(renderer.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use futures_util::stream;

    fn content(fragments: &[&str]) -> Vec<StreamChunk> {
        fragments
            .iter()
            .map(|f| StreamChunk::Content(f.to_string()))
            .collect()
    }

    fn render(chunks: Vec<StreamChunk>, term_width: usize) -> (String, String) {
        let mut out = Vec::new();
        let text = {
            let mut renderer = StreamRenderer::begin(&mut out, term_width).unwrap();
            for chunk in chunks {
                renderer.push(chunk).unwrap();
            }
            renderer.finish().unwrap()
        };
        (text, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_plain_reply() {
        let chunks = content(&["Hello", " there", ",", " how", " are", " you", "?"]);
        let (text, printed) = render(chunks, 80);
        assert_eq!(text, "Hello there, how are you?");
        assert!(printed.contains("Hello there, how are you?"));
        assert_eq!(printed, "\n       Hello there, how are you?\n\n");
    }

    #[test]
    fn test_role_announcement_is_silent() {
        let mut chunks = vec![StreamChunk::RoleAnnouncement];
        chunks.extend(content(&["hi"]));
        let (text, printed) = render(chunks, 80);
        assert_eq!(text, "hi");
        assert_eq!(printed, "\n       hi\n\n");
    }

    #[test]
    fn test_wraps_past_right_margin() {
        // end cursor is 13 at width 20
        let chunks = content(&["Hello", " there", ",", " how", " are"]);
        let (text, printed) = render(chunks, 20);
        assert_eq!(text, "Hello there, how are");
        assert_eq!(printed, "\n       Hello there,\n       how are\n\n");
    }

    #[test]
    fn test_wrap_without_leading_space_keeps_fragment() {
        let chunks = content(&["abcdefghij", "x y"]);
        let (text, printed) = render(chunks, 20);
        assert_eq!(text, "abcdefghijx y");
        assert_eq!(printed, "\n       abcdefghij\n       x y\n\n");
    }

    #[test]
    fn test_newline_resets_cursor() {
        let mut out = Vec::new();
        let mut renderer = StreamRenderer::begin(&mut out, 80).unwrap();
        renderer
            .push(StreamChunk::Content("line one\n".into()))
            .unwrap();
        assert_eq!(renderer.cursor(), START_CURSOR);
        renderer.push(StreamChunk::Content("two".into())).unwrap();
        assert_eq!(renderer.cursor(), START_CURSOR + 3);
        renderer.finish().unwrap();
        drop(renderer);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\n       line one\n       two\n\n"
        );
    }

    #[test]
    fn test_cursor_counts_chars_not_columns() {
        let mut renderer = StreamRenderer::begin(io::sink(), 80).unwrap();
        renderer.push(StreamChunk::Content("日本語".into())).unwrap();
        assert_eq!(renderer.cursor(), START_CURSOR + 3);
        renderer.push(StreamChunk::Content("héllo".into())).unwrap();
        assert_eq!(renderer.cursor(), START_CURSOR + 8);
    }

    #[test]
    fn test_state_transitions() {
        let mut renderer = StreamRenderer::begin(io::sink(), 80).unwrap();
        assert_eq!(renderer.state(), RenderState::AwaitingFirstChunk);
        renderer.push(StreamChunk::RoleAnnouncement).unwrap();
        assert_eq!(renderer.state(), RenderState::AwaitingFirstChunk);
        renderer.push(StreamChunk::Content("a".into())).unwrap();
        assert_eq!(renderer.state(), RenderState::Streaming);
        renderer.finish().unwrap();
        assert_eq!(renderer.state(), RenderState::Done);
    }

    #[test]
    fn test_accumulated_text_is_concatenation() {
        let fragments = [
            "A", " long", " answer", " that", " keeps", " going", "\n", "and", " wraps",
            " around", " the", " narrow", " terminal", " several", " times", ".",
        ];
        for width in [10, 20, 33, 80] {
            let (text, _) = render(content(&fragments), width);
            assert_eq!(text, fragments.concat());
        }
    }

    #[tokio::test]
    async fn test_render_stream_collects_text() {
        let chunks: Vec<Result<StreamChunk>> = vec![
            Ok(StreamChunk::RoleAnnouncement),
            Ok(StreamChunk::Content("Hi".into())),
            Ok(StreamChunk::Content(" you".into())),
        ];
        let mut renderer = StreamRenderer::begin(io::sink(), 80).unwrap();
        let text = render_stream(stream::iter(chunks), &mut renderer)
            .await
            .unwrap();
        assert_eq!(text, "Hi you");
        assert_eq!(renderer.fragment_count(), 2);
    }

    #[tokio::test]
    async fn test_render_stream_propagates_error() {
        let chunks: Vec<Result<StreamChunk>> = vec![
            Ok(StreamChunk::Content("partial".into())),
            Err(Error::collaborator("connection reset")),
        ];
        let mut renderer = StreamRenderer::begin(io::sink(), 80).unwrap();
        let err = render_stream(stream::iter(chunks), &mut renderer)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Collaborator(_)));
        assert_eq!(renderer.state(), RenderState::Streaming);
    }
}
