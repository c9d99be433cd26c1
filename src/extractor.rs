use crate::config::{LangFilter, Options};
use crate::loader::FileRecord;
use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd};

/// A code block extracted from markdown.
///
/// Code blocks are identified by fenced code syntax in markdown:
///
/// ````markdown
/// ```js
/// var answer = 42;
/// ```
/// ````
///
/// # Attributes
///
/// The fence info string may carry attributes after the language, separated
/// by commas or spaces. `ignore` excludes the block from linting:
///
/// ````markdown
/// ```js,ignore
/// var deliberately_bad = 'example';
/// ```
/// ````
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeToken {
    /// The code content
    pub text: String,
    /// The language from the fence marker (e.g., "js", "javascript"), empty for indented blocks
    pub lang: String,
}

/// The code blocks of one file that passed the language filter.
pub struct FileTokenSet<'a> {
    pub file: &'a str,
    pub tokens: CodeTokens<'a>,
}

/// Lazily walks a Markdown document, yielding matching code blocks in document order.
///
/// The markdown is parsed as the iterator advances, so the sequence can only be
/// consumed once.
pub struct CodeTokens<'a> {
    parser: Parser<'a>,
    filter: &'a LangFilter,
}

impl<'a> CodeTokens<'a> {
    pub fn new(content: &'a str, filter: &'a LangFilter) -> Self {
        Self {
            parser: Parser::new(content),
            filter,
        }
    }
}

impl Iterator for CodeTokens<'_> {
    type Item = CodeToken;

    fn next(&mut self) -> Option<CodeToken> {
        // (lang, code) of the block being read, when it passed the filter
        let mut current: Option<(String, String)> = None;

        for event in self.parser.by_ref() {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let info = match &kind {
                        CodeBlockKind::Fenced(info) => info.as_ref(),
                        CodeBlockKind::Indented => "",
                    };
                    let (lang, flags) = parse_fence_info(info);
                    let wanted = !flags.contains(&"ignore") && self.filter.matches(&lang);
                    if !wanted {
                        log::trace!("Skipping code block with language '{}'", lang);
                    }
                    current = wanted.then(|| (lang, String::new()));
                }

                Event::Text(text) => {
                    if let Some((_, code)) = current.as_mut() {
                        code.push_str(&text);
                    }
                }

                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, text)) = current.take() {
                        return Some(CodeToken { text, lang });
                    }
                }

                _ => {}
            }
        }

        None
    }
}

/// Extracts the code blocks of a file whose language matches `options.lang`.
pub fn tokenize_file<'a>(options: &'a Options, file: &'a FileRecord) -> FileTokenSet<'a> {
    FileTokenSet {
        file: &file.name,
        tokens: CodeTokens::new(&file.contents, &options.lang),
    }
}

/// Parse fence info string into language and flags
/// Examples:
/// - "js" -> ("js", [])
/// - "js,ignore" -> ("js", ["ignore"])
/// - "javascript title=demo.js" -> ("javascript", ["title=demo.js"])
fn parse_fence_info(info: &str) -> (String, Vec<&str>) {
    let mut parts = info
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty());

    let language = parts.next().unwrap_or_default().to_string();
    let flags = parts.collect();

    (language, flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLIDES: &str = r#"# Some code

```js
var myVar = "foo";
```

And then another:

```javascript
while( 1 ) console.log( "crash your browser" );
```

    var indented = true;

```css
body { color: red; }
```
"#;

    fn record(contents: &str) -> FileRecord {
        FileRecord {
            name: "slides.md".to_string(),
            contents: contents.to_string(),
        }
    }

    fn langs(options: &Options, contents: &str) -> Vec<String> {
        let file = record(contents);
        tokenize_file(options, &file).tokens.map(|t| t.lang).collect()
    }

    #[test]
    fn test_default_filter_selects_javascript_blocks() {
        assert_eq!(langs(&Options::default(), SLIDES), vec!["js", "javascript"]);
    }

    #[test]
    fn test_exact_language_filter() {
        let options = Options {
            lang: LangFilter::Exact("js".to_string()),
            ..Options::default()
        };
        let file = record(SLIDES);
        let set = tokenize_file(&options, &file);
        assert_eq!(set.file, "slides.md");

        let tokens: Vec<_> = set.tokens.collect();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "var myVar = \"foo\";\n");
    }

    #[test]
    fn test_any_filter_includes_every_block() {
        let options = Options {
            lang: LangFilter::Any,
            ..Options::default()
        };
        assert_eq!(langs(&options, SLIDES), vec!["js", "javascript", "", "css"]);
    }

    #[test]
    fn test_ignore_attribute_skips_block() {
        let markdown = "```js,ignore\nvar bad_name = 'x';\n```\n\n```js\nok();\n```\n";
        let file = record(markdown);
        let options = Options::default();
        let tokens: Vec<_> = tokenize_file(&options, &file).tokens.collect();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "ok();\n");
    }

    #[test]
    fn test_tokens_are_consumed_once() {
        let file = record(SLIDES);
        let options = Options::default();
        let mut tokens = tokenize_file(&options, &file).tokens;
        assert!(tokens.next().is_some());
        assert!(tokens.next().is_some());
        assert!(tokens.next().is_none());
        assert!(tokens.next().is_none());
    }

    #[test]
    fn test_document_without_code() {
        assert!(langs(&Options::default(), "# Title\n\nJust prose.\n").is_empty());
    }

    #[test]
    fn test_parse_fence_info() {
        let (lang, flags) = parse_fence_info("js");
        assert_eq!(lang, "js");
        assert!(flags.is_empty());

        let (lang, flags) = parse_fence_info("js,ignore");
        assert_eq!(lang, "js");
        assert_eq!(flags, vec!["ignore"]);

        let (lang, flags) = parse_fence_info("javascript title=demo.js");
        assert_eq!(lang, "javascript");
        assert_eq!(flags, vec!["title=demo.js"]);

        let (lang, flags) = parse_fence_info("");
        assert_eq!(lang, "");
        assert!(flags.is_empty());
    }
}
