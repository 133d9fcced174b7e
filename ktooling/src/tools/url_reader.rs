//! Web page text extraction tool.

use std::sync::Arc;

use kprovider::ToolDefinition;
use reqwest::Client;
use scraper::{ElementRef, Html, Node, Selector};
use serde_json::{Map, Value};

use crate::{
    Tool, ToolError, ToolExecutionContext, ToolFuture, ToolResult, required_string,
    string_parameters,
};

pub const GET_URL_CONTENT: &str = "get_url_content";
pub const MAX_PAGE_CHARS: usize = 5000;

const SKIPPED_ELEMENTS: [&str; 8] = [
    "script", "style", "noscript", "iframe", "nav", "footer", "header", "aside",
];

pub trait PageFetcher: Send + Sync + std::fmt::Debug {
    fn fetch<'a>(&'a self, url: &'a str) -> ToolFuture<'a, Result<String, ToolError>>;
}

#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl PageFetcher for HttpPageFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> ToolFuture<'a, Result<String, ToolError>> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|err| ToolError::execution(format!("request to {url} failed: {err}")))?;

            let status = response.status();
            if !status.is_success() {
                return Err(ToolError::execution(format!("{url} returned http {status}")));
            }

            response
                .text()
                .await
                .map_err(|err| ToolError::execution(format!("failed to read {url}: {err}")))
        })
    }
}

#[derive(Debug, Clone)]
pub struct UrlReaderTool {
    fetcher: Arc<dyn PageFetcher>,
}

impl UrlReaderTool {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }
}

impl Tool for UrlReaderTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            GET_URL_CONTENT,
            "Read the main text of a web page when the user shares a URL or asks what a page says.",
            string_parameters(&[("url", "Full URL of the page, e.g. https://example.com/article")]),
        )
    }

    fn invoke<'a>(
        &'a self,
        args: &'a Map<String, Value>,
        _context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<ToolResult, ToolError>> {
        Box::pin(async move {
            let url = required_string(args, "url")?;
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ToolError::invalid_arguments(format!(
                    "argument 'url' must be an http(s) URL, got '{url}'"
                )));
            }

            let html = match self.fetcher.fetch(&url).await {
                Ok(html) => html,
                Err(error) => {
                    return Ok(ToolResult::soft_failure(
                        format!("Sorry, I couldn't open {url}."),
                        error.to_string(),
                    ));
                }
            };

            let text = extract_body_text(&html);
            if text.is_empty() {
                return Ok(ToolResult::soft_failure(
                    format!("I opened {url} but couldn't find any readable text on it."),
                    "no text extracted from page body",
                ));
            }

            Ok(ToolResult::ok(truncate_chars(&text, MAX_PAGE_CHARS)))
        })
    }
}

/// Visible text of the `<body>`, with non-content elements removed and
/// whitespace collapsed.
pub fn extract_body_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let body = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element());

    let mut text = String::new();
    collect_text(body, &mut text);
    collapse_whitespace(&text)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            Node::Element(inner) if SKIPPED_ELEMENTS.contains(&inner.name()) => {}
            Node::Element(_) => {
                if let Some(inner) = ElementRef::wrap(child) {
                    collect_text(inner, out);
                }
            }
            _ => {}
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((index, _)) => format!("{}...", &text[..index]),
        None => text.to_string(),
    }
}
