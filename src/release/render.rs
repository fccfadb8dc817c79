//! Markdown rendering of release-note documents.

use chrono::NaiveDate;
use minijinja::{Environment, context};

use crate::error::ReleaseError;
use crate::github::RepoRef;

use super::document::{Category, ReleaseNote, ReleaseNoteDocument};
use super::product::OTHERS;
use super::structure::StructureNode;

/// `strftime` pattern for the release date, e.g. `April 07, 2021`.
pub const DATE_FORMAT: &str = "%B %d, %Y";

const FOUR_SPACES: &str = "    ";

const HEADER: &str = "\
---
title: {{ name }} {{ version }} Release Notes
category: Releases
aliases: ['/docs/dev/releases/{{ version }}/']
---

# {{ name }} {{ version }} Release Notes

Release date: {{ date }}

{{ name }} version: {{ version }}";

/// Renders the document as Markdown.
///
/// Categories appear in document order with `Others` last. Outline nodes
/// without notes in a category are left out of that category.
///
/// # Errors
///
/// Returns [`ReleaseError::Configuration`] if the front matter fails to
/// render.
pub fn render(document: &ReleaseNoteDocument, date: NaiveDate) -> Result<String, ReleaseError> {
    let mut output = render_header(document, date)?;
    output.push_str("\n\n");

    let ordered = document
        .categories()
        .iter()
        .filter(|category| category.name != OTHERS)
        .chain(document.category(OTHERS));
    for category in ordered {
        write_category(&mut output, category, &document.structure);
    }

    if output.ends_with('\n') {
        output.pop();
    }
    Ok(output)
}

/// Uppercases the first character when it is an ASCII lowercase letter.
///
/// ```
/// use releaser::release::render::ucfirst;
///
/// assert_eq!(ucfirst("hA"), "HA");
/// assert_eq!(ucfirst("修复"), "修复");
/// ```
#[must_use]
pub fn ucfirst(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {
            let mut capitalised = String::with_capacity(text.len());
            capitalised.push(first.to_ascii_uppercase());
            capitalised.push_str(chars.as_str());
            capitalised
        }
        _ => text.to_owned(),
    }
}

fn render_header(document: &ReleaseNoteDocument, date: NaiveDate) -> Result<String, ReleaseError> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| minijinja::AutoEscape::None);

    let ctx = context! {
        name => document.product.as_str(),
        version => document.version.as_str(),
        date => date.format(DATE_FORMAT).to_string(),
    };
    env.render_str(HEADER, ctx)
        .map_err(|e| ReleaseError::Configuration {
            message: format!("front matter rendering failed: {e}"),
        })
}

fn write_category(output: &mut String, category: &Category, structure: &[StructureNode]) {
    let has_notes = |repo: &RepoRef| has_notes(category, repo);
    if !structure.iter().any(|node| node.any_leaf(&has_notes)) {
        return;
    }
    output.push_str("## ");
    output.push_str(&category.name);
    output.push_str("\n\n");
    write_nodes(output, 0, structure, category);
}

fn has_notes(category: &Category, repo: &RepoRef) -> bool {
    category
        .notes_for(repo)
        .is_some_and(|entry| !entry.notes.is_empty())
}

fn write_nodes(output: &mut String, depth: usize, nodes: &[StructureNode], category: &Category) {
    let has_notes = |repo: &RepoRef| has_notes(category, repo);

    for node in nodes {
        if !node.any_leaf(&has_notes) {
            continue;
        }
        match node {
            StructureNode::Group { title, children } => {
                output.push_str(&list_prefix(depth));
                output.push_str(title);
                output.push_str("\n\n");
                write_nodes(output, depth.saturating_add(1), children, category);
            }
            StructureNode::Repository(repo) => {
                let Some(entry) = category.notes_for(repo) else {
                    continue;
                };
                output.push_str(&list_prefix(depth));
                output.push_str(entry.display_name());
                output.push_str("\n\n");
                for note in &entry.notes {
                    output.push_str(&list_prefix(depth.saturating_add(1)));
                    output.push_str(&format_note(note));
                    output.push('\n');
                }
                output.push('\n');
            }
        }
    }
}

fn list_prefix(depth: usize) -> String {
    match depth {
        0 => "+ ".to_owned(),
        1 => format!("{FOUR_SPACES}- "),
        _ => format!("{}* ", FOUR_SPACES.repeat(depth)),
    }
}

fn format_note(note: &ReleaseNote) -> String {
    format!(
        "{text} [#{number}]({url})",
        text = ucfirst(&note.text),
        number = note.pull_number,
        url = note.repo.pull_url(note.pull_number),
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::NaiveDate;
    use rstest::{fixture, rstest};

    use super::{list_prefix, render, ucfirst};
    use crate::github::RepoRef;
    use crate::release::document::{ReleaseNote, ReleaseNoteDocument};
    use crate::release::product::{OTHERS, Product};
    use crate::release::structure::parse_structure;

    const EXPECTED: &str = "\
---
title: TiDB v5.0.0 Release Notes
category: Releases
aliases: ['/docs/dev/releases/v5.0.0/']
---

# TiDB v5.0.0 Release Notes

Release date: April 07, 2021

TiDB version: v5.0.0

## Bug Fixes

+ TiDB

    - Fix a panic [#1](https://github.com/pingcap/tidb/pull/1)

+ Tools

    - br

        * Fix restore [#2](https://github.com/pingcap/br/pull/2)

## Others

+ Tools

    - dumpling

        * Tweak logs [#3](https://github.com/pingcap/dumpling/pull/3)
";

    fn repo(slug: &str) -> RepoRef {
        RepoRef::parse(slug).expect("repo should parse")
    }

    fn note(slug: &str, pull_number: u64, text: &str) -> ReleaseNote {
        ReleaseNote {
            repo: repo(slug),
            pull_number,
            text: text.to_owned(),
        }
    }

    fn release_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 4, 7).expect("valid date")
    }

    #[fixture]
    fn product() -> Product {
        let structure =
            parse_structure(&["pingcap/tidb", "pingcap/pd", "Tools: pingcap/br, pingcap/dumpling"])
                .expect("structure should parse");
        Product::new(
            "TiDB",
            vec![
                repo("pingcap/tidb"),
                repo("pingcap/pd"),
                repo("pingcap/br"),
                repo("pingcap/dumpling"),
            ],
        )
        .with_structure(structure)
        .with_renames(HashMap::from([(repo("pingcap/tidb"), repo("pingcap/TiDB"))]))
    }

    #[fixture]
    fn document(product: Product) -> ReleaseNoteDocument {
        let mut document = ReleaseNoteDocument::new("TiDB", "en", "releases/5.0.0.md", "v5.0.0");
        document.upsert(OTHERS, note("pingcap/dumpling", 3, "tweak logs"), None);
        document.upsert("Bug Fixes", note("pingcap/tidb", 1, "fix a panic"), None);
        document.upsert("Bug Fixes", note("pingcap/br", 2, "Fix restore"), None);
        document.refresh(&product);
        document
    }

    #[rstest]
    fn renders_nested_outline(document: ReleaseNoteDocument) {
        let rendered = render(&document, release_date()).expect("render should succeed");
        assert_eq!(rendered, EXPECTED);
    }

    #[rstest]
    fn rendering_is_idempotent(document: ReleaseNoteDocument) {
        let first = render(&document, release_date()).expect("render should succeed");
        let second = render(&document, release_date()).expect("render should succeed");
        assert_eq!(first, second);
    }

    #[rstest]
    fn published_output_parses_back_to_the_same_text(
        document: ReleaseNoteDocument,
        product: Product,
    ) {
        let rendered = render(&document, release_date()).expect("render should succeed");
        let mut reparsed = ReleaseNoteDocument::new("TiDB", "en", "releases/5.0.0.md", "v5.0.0")
            .parse(&rendered)
            .expect("rendered output should parse");
        reparsed.refresh(&product);

        let rerendered = render(&reparsed, release_date()).expect("render should succeed");
        assert_eq!(rerendered, rendered);
    }

    #[rstest]
    fn groups_without_notes_are_pruned(product: Product) {
        let mut document = ReleaseNoteDocument::new("TiDB", "en", "a.md", "v5.0.0");
        document.upsert("Bug Fixes", note("pingcap/pd", 5, "fix leader transfer"), None);
        document.refresh(&product);

        let rendered = render(&document, release_date()).expect("render should succeed");

        assert!(!rendered.contains("Tools"));
        assert!(!rendered.contains("TiDB\n\n    -"));
        assert!(rendered.ends_with("+ pd\n\n    - Fix leader transfer [#5](https://github.com/pingcap/pd/pull/5)\n"));
    }

    #[rstest]
    fn categories_with_only_unplaced_notes_are_omitted(product: Product) {
        let mut document = ReleaseNoteDocument::new("TiDB", "en", "a.md", "v5.0.0");
        document.upsert("Improvements", note("pingcap/ticdc", 9, "speed up sink"), None);
        document.upsert("Bug Fixes", note("pingcap/pd", 5, "fix leader transfer"), None);
        document.refresh(&product);

        let rendered = render(&document, release_date()).expect("render should succeed");

        assert!(!rendered.contains("## Improvements"));
        assert!(!rendered.contains("Speed up sink"));
        assert!(rendered.contains("## Bug Fixes\n\n+ pd\n"));
    }

    #[test]
    fn empty_document_is_only_the_header() {
        let document = ReleaseNoteDocument::new("TiKV", "en", "a.md", "v5.0.0");
        let rendered = render(&document, release_date()).expect("render should succeed");
        assert!(rendered.ends_with("TiKV version: v5.0.0\n"));
        assert!(!rendered.contains("##"));
    }

    #[rstest]
    #[case::ascii("hA", "HA")]
    #[case::already_upper("Fix", "Fix")]
    #[case::empty("", "")]
    #[case::digit("1 fix", "1 fix")]
    #[case::emoji("🎉 party", "🎉 party")]
    #[case::cjk("修复问题", "修复问题")]
    #[case::accented("école", "école")]
    fn ucfirst_only_touches_ascii_lowercase(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(ucfirst(input), expected);
    }

    #[rstest]
    #[case(0, "+ ")]
    #[case(1, "    - ")]
    #[case(2, "        * ")]
    #[case(3, "            * ")]
    fn prefixes_depend_on_depth(#[case] depth: usize, #[case] expected: &str) {
        assert_eq!(list_prefix(depth), expected);
    }
}
