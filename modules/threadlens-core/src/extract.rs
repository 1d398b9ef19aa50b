use scraper::{ElementRef, Html, Selector};
use tracing::info;

use threadlens_common::{QuestionThread, ThreadLensError, MAX_ANSWERS};

/// Title candidates, most specific first. The first two cover the two
/// live page layouts; `title` is the last-resort document title.
const TITLE_SELECTORS: &[&str] = &["h1.fs-headline1", "a.question-hyperlink", "title"];

/// Post-body candidates: `s-prose` is the current markup, `post-text`
/// the legacy one. The question body is the first match in document
/// order; on a question page it precedes every answer.
const BODY_SELECTORS: &[&str] = &["div.s-prose", "div.post-text"];

/// Answer containers, current then legacy layout.
const ANSWER_SELECTORS: &[&str] = &["div.answer", "div.answercell"];

const TAG_SELECTOR: &str = "a.post-tag";

pub const TITLE_PLACEHOLDER: &str = "No title found";

/// Parse a question page into the canonical shape. Fields that fail to
/// resolve degrade (placeholder title, empty body, fewer answers)
/// rather than failing; only a selector that does not compile is an
/// error.
pub fn extract_thread(html: &str, url: &str) -> Result<QuestionThread, ThreadLensError> {
    let document = Html::parse_document(html);

    let title = first_match(&document, TITLE_SELECTORS)?
        .map(|el| element_text(&el))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| TITLE_PLACEHOLDER.to_string());

    let question_body = first_match(&document, BODY_SELECTORS)?
        .map(|el| element_text(&el))
        .unwrap_or_default();

    let answers = extract_answers(&document)?;

    let tag_selector = parse_selector(TAG_SELECTOR)?;
    let tags: Vec<String> = document
        .select(&tag_selector)
        .map(|el| element_text(&el))
        .collect();

    info!(
        url,
        title_chars = title.len(),
        question_chars = question_body.len(),
        answers = answers.len(),
        tags = tags.len(),
        "Parsed question page"
    );

    Ok(QuestionThread {
        title,
        question_body,
        answers,
        tags,
        source_url: url.to_string(),
    })
}

fn extract_answers(document: &Html) -> Result<Vec<String>, ThreadLensError> {
    let mut containers = Vec::new();
    for candidate in ANSWER_SELECTORS {
        let selector = parse_selector(candidate)?;
        containers = document.select(&selector).take(MAX_ANSWERS).collect();
        if !containers.is_empty() {
            break;
        }
    }

    let mut answers = Vec::new();
    for container in containers {
        // Containers without a recognizable body are skipped, not
        // recorded as empty answers.
        for candidate in BODY_SELECTORS {
            let selector = parse_selector(candidate)?;
            if let Some(body) = container.select(&selector).next() {
                answers.push(element_text(&body));
                break;
            }
        }
    }
    Ok(answers)
}

/// First element matching any candidate selector, tried in priority
/// order.
fn first_match<'a>(
    document: &'a Html,
    candidates: &[&str],
) -> Result<Option<ElementRef<'a>>, ThreadLensError> {
    for candidate in candidates {
        let selector = parse_selector(candidate)?;
        if let Some(element) = document.select(&selector).next() {
            return Ok(Some(element));
        }
    }
    Ok(None)
}

fn parse_selector(css: &str) -> Result<Selector, ThreadLensError> {
    Selector::parse(css).map_err(|e| ThreadLensError::Parse(format!("bad selector {css:?}: {e}")))
}

fn element_text(element: &ElementRef) -> String {
    let text: String = element.text().collect::<Vec<_>>().join(" ");
    text.trim().to_string()
}
