//! Search command - phrase and filter search across transcripts

use anyhow::Result;
use colored::Colorize;
use regex::Regex;
use tokio_util::sync::CancellationToken;
use vod_core::TranscriptSearch;
use vod_store::ArchiveService;

use crate::cli::{Cli, FilterArgs, OutputFormat};
use crate::output::{colors, human, json, minimal};

pub async fn run(
    cli: &Cli,
    service: &ArchiveService,
    cancel: &CancellationToken,
    phrase: Option<&str>,
    filter: &FilterArgs,
    whole_word: bool,
    words: Option<i32>,
) -> Result<()> {
    let query = filter.to_query(cli.access(), phrase, whole_word);
    let searchable = query.normalized_phrase().is_some();
    let mut results = service.search(query, cancel).await?;

    if let (Some(phrase), Some(words), true) = (phrase, words, searchable) {
        shorten_contexts(&mut results, phrase, words);
    }

    match cli.effective_format() {
        OutputFormat::Human => {
            if results.is_empty() {
                match phrase {
                    Some(phrase) => println!("No results found for: {}", phrase.cyan()),
                    None => println!("No transcripts match the filters"),
                }
                return Ok(());
            }

            let title = match phrase {
                Some(phrase) => format!("Search results for '{}' ({})", phrase, results.len()),
                None => format!("Transcripts ({})", results.len()),
            };
            println!("{}", colors::header(&title));

            let matchers = match (phrase, searchable) {
                (Some(phrase), true) => {
                    let cache = service.db().matchers();
                    vec![cache.literal(phrase, whole_word)?, cache.get(phrase, whole_word)?]
                }
                _ => Vec::new(),
            };
            let restricted = service.db().restricted_type();

            for result in &results {
                println!();
                println!("{}", human::format_metadata(&result.metadata, restricted));
                for context in &result.contexts {
                    let spans = match_spans(&matchers, &context.line);
                    println!("{}", human::format_context(context, &context.line, &spans));
                }
            }
        }
        OutputFormat::Json => json::print(&results, cli.pretty)?,
        OutputFormat::Minimal => {
            for result in &results {
                if result.contexts.is_empty() {
                    println!("{}", minimal::format_metadata(&result.metadata));
                }
                for context in &result.contexts {
                    println!("{}\t{}\t{}", result.metadata.id, context.start_time, context.line);
                }
            }
        }
    }

    Ok(())
}

/// Replace each context line with an excerpt around the phrase
fn shorten_contexts(results: &mut [TranscriptSearch], phrase: &str, words: i32) {
    for result in results {
        for context in &mut result.contexts {
            context.line = context.excerpt(phrase, words);
        }
    }
}

/// Spans of the first matcher that hits `text`
fn match_spans(matchers: &[Regex], text: &str) -> Vec<(usize, usize)> {
    matchers
        .iter()
        .map(|re| re.find_iter(text).map(|m| (m.start(), m.end())).collect::<Vec<_>>())
        .find(|spans| !spans.is_empty())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vod_core::{SearchContext, TranscriptMetadata};
    use vod_store::MatcherCache;

    #[test]
    fn test_match_spans_whole_word() {
        let cache = MatcherCache::new();
        let re = cache.literal("cat", true).unwrap();
        assert_eq!(match_spans(&[re], "Cat concat cat"), vec![(0, 3), (11, 14)]);
        assert!(match_spans(&[], "cat").is_empty());
    }

    #[test]
    fn test_match_spans_punctuated_phrase() {
        let cache = MatcherCache::new();
        let matchers = [
            cache.literal("don't", true).unwrap(),
            cache.get("don't", true).unwrap(),
        ];
        assert_eq!(match_spans(&matchers, "I don't know"), vec![(2, 7)]);

        // Falls back to the normalized matcher when the typed form is absent
        let matchers = [
            cache.literal("hello, world", false).unwrap(),
            cache.get("hello, world", false).unwrap(),
        ];
        assert_eq!(match_spans(&matchers, "Hello world!"), vec![(0, 11)]);
        assert_eq!(match_spans(&matchers, "so, hello, world"), vec![(4, 16)]);
    }

    #[test]
    fn test_shorten_contexts() {
        let mut results = vec![TranscriptSearch {
            metadata: TranscriptMetadata::default(),
            contexts: vec![SearchContext {
                start_time: "00:00:01".into(),
                line: "one two three four five".into(),
            }],
        }];
        shorten_contexts(&mut results, "three", 1);
        assert_eq!(results[0].contexts[0].line, "___ two three four ___");
    }
}
