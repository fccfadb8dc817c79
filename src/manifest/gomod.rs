//! `go.mod` parsing.
//!
//! Only `module` and `require` directives are read; `replace` and
//! `exclude` are ignored.

use super::Dependency;

/// Module name and required dependencies of a `go.mod` file.
pub(super) fn parse(text: &str) -> (String, Vec<Dependency>) {
    let mut name = String::new();
    let mut dependencies = Vec::new();
    let mut in_require = false;

    for raw in text.lines() {
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }
        if in_require {
            if line == ")" {
                in_require = false;
            } else {
                dependencies.extend(requirement(line));
            }
            continue;
        }
        if let Some(module) = directive(line, "module") {
            module.trim_matches('"').clone_into(&mut name);
        } else if let Some(required) = directive(line, "require") {
            if required == "(" {
                in_require = true;
            } else {
                dependencies.extend(requirement(required));
            }
        }
    }
    (name, dependencies)
}

fn strip_comment(line: &str) -> &str {
    line.split_once("//").map_or(line, |(code, _)| code)
}

fn directive<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    rest.starts_with(char::is_whitespace).then(|| rest.trim())
}

fn requirement(line: &str) -> Option<Dependency> {
    let mut fields = line.split_whitespace();
    let name = fields.next()?;
    let version = fields.next()?;
    fields.next().is_none().then(|| Dependency {
        name: name.trim_matches('"').to_owned(),
        version: version.to_owned(),
    })
}
