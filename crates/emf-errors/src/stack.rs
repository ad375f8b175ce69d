use std::backtrace::Backtrace;
use std::sync::OnceLock;

/// Frames beyond this count get trimmed at both ends
const MIN_TRIMMED_FRAMES: usize = 9;
/// Innermost frames belong to the error construction machinery
const INNER_FRAMES: usize = 3;
/// Outermost frames belong to runtime bootstrap
const OUTER_FRAMES: usize = 6;

/// Call stack attached to an error instance
///
/// Frames are captured eagerly at construction, but symbolizing and
/// formatting them happens on first read and is memoized.
#[derive(Debug)]
pub(crate) struct StackTrace {
    captured: Option<Backtrace>,
    rendered: OnceLock<String>,
}

impl StackTrace {
    pub(crate) fn capture() -> Self {
        Self {
            captured: Some(Backtrace::force_capture()),
            rendered: OnceLock::new(),
        }
    }

    pub(crate) fn empty() -> Self {
        Self {
            captured: None,
            rendered: OnceLock::new(),
        }
    }

    /// Stack text received from another service, kept verbatim
    pub(crate) fn remote(text: String) -> Self {
        Self {
            captured: None,
            rendered: OnceLock::from(text),
        }
    }

    /// Trimmed trace text, computed on first call
    pub(crate) fn text(&self) -> &str {
        self.rendered.get_or_init(|| {
            self.captured
                .as_ref()
                .map(|backtrace| trim_frames(&backtrace.to_string()))
                .unwrap_or_default()
        })
    }

    /// Trace text only if something already forced it
    pub(crate) fn rendered(&self) -> Option<&str> {
        self.rendered.get().map(String::as_str).filter(|text| !text.is_empty())
    }
}

/// Split rendered backtrace text into frames and drop the glue at both ends
///
/// A frame starts at a line of the form `<index>: <symbol>`; the `at` lines
/// that follow belong to it.
fn trim_frames(text: &str) -> String {
    let mut frames: Vec<Vec<&str>> = Vec::new();

    for line in text.lines() {
        if is_frame_header(line) || frames.is_empty() {
            frames.push(vec![line]);
        } else if let Some(frame) = frames.last_mut() {
            frame.push(line);
        }
    }

    let kept = if frames.len() > MIN_TRIMMED_FRAMES {
        &frames[INNER_FRAMES..frames.len() - OUTER_FRAMES]
    } else {
        &frames[..]
    };

    kept.iter().map(|frame| frame.join("\n")).collect::<Vec<_>>().join("\n")
}

fn is_frame_header(line: &str) -> bool {
    line.trim_start()
        .split_once(':')
        .is_some_and(|(index, _)| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
}
