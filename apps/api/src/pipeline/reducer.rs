//! Text Reducer: turns a fetched HTML page into bounded, readable plain text.

use scraper::{ElementRef, Html, Node};

use crate::pipeline::{truncate_chars, ErrorKind, JobText, Limits, PipelineError};

/// Subtrees with no reader-facing content. Their text is never collected.
const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "iframe", "noscript",
];

/// Block-level elements. A space is emitted on both sides of one so text
/// before, inside and after it never fuses into a single word.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "section", "article", "main", "aside", "li", "ul", "ol", "dl", "dt", "dd",
    "table", "tr", "td", "th", "h1", "h2", "h3", "h4", "h5", "h6", "br", "hr", "blockquote",
    "pre",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct TextReducer {
    limits: Limits,
}

impl TextReducer {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    /// Reduces raw HTML to at most `job_text_cap` characters of body text.
    ///
    /// Fails with `ContentTooShort` if fewer than `min_job_content` characters
    /// remain after cleanup.
    pub fn reduce(&self, html: &str) -> Result<JobText, PipelineError> {
        let text = visible_text(html);
        let text = truncate_chars(&text, self.limits.job_text_cap);

        let len = text.chars().count();
        if len < self.limits.min_job_content {
            return Err(PipelineError::new(
                ErrorKind::ContentTooShort,
                "The job posting page did not contain enough readable text. \
                 Please check the link or try a different posting URL.",
            )
            .with_detail(format!(
                "reduced text has {len} chars, minimum is {}",
                self.limits.min_job_content
            )));
        }

        Ok(JobText::new(text))
    }
}

/// One step of the document walk.
enum Step<'a> {
    Open(ElementRef<'a>),
    Text(&'a str),
    Close,
}

/// Body text with boilerplate subtrees removed and whitespace collapsed.
fn visible_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let root = doc.root_element();
    let body = root
        .children()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "body")
        .unwrap_or(root);

    // Explicit stack, so deeply nested markup cannot exhaust the call stack.
    let mut raw = String::new();
    let mut stack = vec![Step::Open(body)];
    while let Some(step) = stack.pop() {
        match step {
            Step::Text(text) => raw.push_str(text),
            Step::Close => raw.push(' '),
            Step::Open(el) => {
                let name = el.value().name();
                if SKIPPED_ELEMENTS.contains(&name) {
                    continue;
                }
                if BLOCK_ELEMENTS.contains(&name) {
                    raw.push(' ');
                    stack.push(Step::Close);
                }
                for child in el.children().rev() {
                    if let Some(child_el) = ElementRef::wrap(child) {
                        stack.push(Step::Open(child_el));
                    } else if let Node::Text(text) = child.value() {
                        stack.push(Step::Text(text));
                    }
                }
            }
        }
    }

    collapse_whitespace(&raw)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOB_BODY: &str = "We are hiring a backend engineer with 5 years Go experience to build \
        distributed payment services, own on-call rotations and mentor junior developers.";

    fn reducer() -> TextReducer {
        TextReducer::default()
    }

    #[test]
    fn test_boilerplate_only_page_is_too_short() {
        let html = r#"<html><head><title>Jobs</title></head><body>
            <header>Company logo and a very long tagline that goes on and on and on forever</header>
            <nav><a href="/">Home</a> <a href="/jobs">Jobs</a> <a href="/about">About us and our mission</a></nav>
            <script>var tracking = "lots of javascript source that is definitely longer than one hundred characters";</script>
            <style>.hero { background: url('/a/very/long/path/to/a/background/image.png'); color: #333; }</style>
            <iframe src="https://ads.example.com">Embedded advertisement fallback text of some length</iframe>
            <noscript>Please enable JavaScript to view this page, it needs scripts to render properly.</noscript>
            <footer>Copyright 2024 Example Corp. All rights reserved. Imprint, privacy policy, cookies.</footer>
        </body></html>"#;

        let err = reducer().reduce(html).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ContentTooShort);
    }

    #[test]
    fn test_empty_page_is_too_short() {
        let err = reducer().reduce("").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ContentTooShort);
    }

    #[test]
    fn test_strips_boilerplate_and_keeps_body_text() {
        let html = format!(
            "<html><body><nav>Menu</nav><main><h1>Backend Engineer</h1><p>{JOB_BODY}</p></main>\
             <script>track()</script><footer>Imprint</footer></body></html>"
        );

        let text = reducer().reduce(&html).unwrap();
        assert!(text.as_str().starts_with("Backend Engineer We are hiring"));
        assert!(!text.as_str().contains("Menu"));
        assert!(!text.as_str().contains("track()"));
        assert!(!text.as_str().contains("Imprint"));
    }

    #[test]
    fn test_collapses_whitespace_and_trims() {
        let html = format!("<body>\n\t  <p>  {JOB_BODY}\n\n\n  More   details\there.  </p>\n</body>");

        let text = reducer().reduce(&html).unwrap();
        assert!(!text.as_str().contains("  "));
        assert!(!text.as_str().contains('\n'));
        assert!(!text.as_str().contains('\t'));
        assert!(text.as_str().ends_with("More details here."));
        assert_eq!(text.as_str(), text.as_str().trim());
    }

    #[test]
    fn test_adjacent_blocks_do_not_fuse() {
        let html = format!("<body><p>{JOB_BODY}</p><p>Remote</p><ul><li>Go</li><li>Kafka</li></ul></body>");

        let text = reducer().reduce(&html).unwrap();
        assert!(text.as_str().contains("developers. Remote Go Kafka"));
    }

    #[test]
    fn test_text_after_closing_block_is_separated() {
        let html = format!("<body><div><p>{JOB_BODY} Requirements</p>Go and Rust</div></body>");

        let text = reducer().reduce(&html).unwrap();
        assert!(text.as_str().contains("Requirements Go and Rust"));

        let text = reducer()
            .reduce(&format!("<body><div><p>{JOB_BODY} A</p>B</div></body>"))
            .unwrap();
        assert!(text.as_str().ends_with("A B"));
    }

    #[test]
    fn test_inline_elements_stay_joined() {
        let html = format!("<body><p>{JOB_BODY} <b>Go</b>lang</p></body>");

        let text = reducer().reduce(&html).unwrap();
        assert!(text.as_str().ends_with("Golang"));
    }

    #[test]
    fn test_long_text_truncated_to_exact_cap() {
        let html = format!("<body><p>{}</p></body>", "word ".repeat(5000));

        let text = reducer().reduce(&html).unwrap();
        assert_eq!(text.as_str().chars().count(), 8000);
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        let html = format!("<body><p>{}</p></body>", "Stellenbeschreibung für Ingenieure ".repeat(400));

        let text = reducer().reduce(&html).unwrap();
        assert_eq!(text.as_str().chars().count(), 8000);
    }

    #[test]
    fn test_custom_cap_is_respected() {
        let limits = Limits {
            job_text_cap: 120,
            ..Limits::default()
        };
        let html = format!("<body><p>{JOB_BODY} {JOB_BODY}</p></body>");

        let text = TextReducer::new(limits).reduce(&html).unwrap();
        assert_eq!(text.as_str().chars().count(), 120);
    }

    #[test]
    fn test_reduce_is_idempotent() {
        let html = format!(
            "<html><body><header>Top</header><div>{JOB_BODY}</div><div>{}</div></body></html>",
            "x ".repeat(6000)
        );

        let first = reducer().reduce(&html).unwrap();
        let second = reducer().reduce(&html).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_text_just_under_threshold_rejected() {
        let html = format!("<body><p>{}</p></body>", "a".repeat(99));
        let err = reducer().reduce(&html).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ContentTooShort);

        let html = format!("<body><p>{}</p></body>", "a".repeat(100));
        assert!(reducer().reduce(&html).is_ok());
    }
}
