//! Plain-text exports of ideas: Markdown, Obsidian notes, daily-note entries
//! and Anki flashcard imports.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Idea;

/// Characters not allowed in exported filenames.
static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("filename regex is valid"));

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

/// Maximum characters of the title used in an Obsidian filename.
const OBSIDIAN_TITLE_CHARS: usize = 30;

/// An Obsidian vault note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObsidianNote {
    pub filename: String,
    pub body: String,
}

/// Markdown suitable for pasting anywhere.
pub fn to_markdown(idea: &Idea) -> String {
    let tags = idea
        .tags()
        .iter()
        .map(|t| format!("`{}`", t))
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "# {}\n\n{}\n\n**Tags**: {}\n\n---\n*Created: {}*",
        idea.title(),
        idea.content(),
        tags,
        idea.created_at().format("%Y-%m-%d %H:%M")
    )
}

/// Obsidian note with YAML front matter.
pub fn to_obsidian_note(idea: &Idea) -> ObsidianNote {
    let created = idea.created_at();
    let mut parts = vec![
        "---".to_string(),
        format!("tags: {}", format_tags_yaml(idea.tags())),
        format!("created: {}", created.format("%Y-%m-%dT%H:%M:%S")),
        "source: ideacap".to_string(),
        "type: idea".to_string(),
        "---".to_string(),
        String::new(),
        format!("# {}", idea.title()),
        String::new(),
        idea.content().to_string(),
    ];

    // Local bytes are written next to the note; synced ideas only have a URL.
    let embed = if idea.image_data().is_some() {
        Some(format!("![[attachments/{}.jpg]]", idea.id()))
    } else {
        idea.image_url().map(|url| format!("![]({})", url))
    };
    if let Some(embed) = embed {
        parts.extend([
            String::new(),
            "## Original image".to_string(),
            String::new(),
            embed,
        ]);
    }

    ObsidianNote {
        filename: format!(
            "{}-{}.md",
            created.format("%Y-%m-%d"),
            sanitize_filename(idea.title(), OBSIDIAN_TITLE_CHARS)
        ),
        body: parts.join("\n"),
    }
}

/// Entry for appending to a daily note.
pub fn to_daily_note_entry(idea: &Idea) -> String {
    let tags = idea
        .tags()
        .iter()
        .map(|t| format!("#{}", t.replace(' ', "-")))
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "## {} - {}\n\n{}\n\n{}\n\n---",
        idea.created_at().format("%H:%M"),
        idea.title(),
        idea.content(),
        tags
    )
}

/// Header lines telling Anki how to read [`to_anki_tsv`] output.
pub const ANKI_IMPORT_HEADER: &str = "#separator:tab\n#html:true\n#tags column:3\n";

/// One Anki note: HTML front and back plus tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnkiCard {
    pub front: String,
    pub back: String,
    pub tags: Vec<String>,
}

/// Card with the title and tags on the front and the content on the back.
pub fn to_anki_card(idea: &Idea) -> AnkiCard {
    let tags_html = idea
        .tags()
        .iter()
        .map(|t| format!("<span class=\"tag\">{}</span>", escape_html(t)))
        .collect::<Vec<_>>()
        .join(" ");

    AnkiCard {
        front: format!(
            "<h2>{}</h2><div class='tags'>{}</div>",
            escape_html(idea.title()),
            tags_html
        ),
        back: format!("<div class='content'>{}</div>", escape_html(idea.content())),
        tags: idea.tags().to_vec(),
    }
}

/// Tab-separated `front<TAB>back<TAB>tags` lines, prefixed with
/// [`ANKI_IMPORT_HEADER`]. Spaces inside a tag become `_` since Anki
/// separates tags with spaces.
pub fn to_anki_tsv(ideas: &[Idea]) -> String {
    let lines = ideas
        .iter()
        .map(|idea| {
            let card = to_anki_card(idea);
            let tags = card
                .tags
                .iter()
                .map(|t| t.replace(' ', "_"))
                .collect::<Vec<_>>()
                .join(" ");
            format!("{}\t{}\t{}", escape_tsv(&card.front), escape_tsv(&card.back), tags)
        })
        .collect::<Vec<_>>();

    format!("{}{}", ANKI_IMPORT_HEADER, lines.join("\n"))
}

/// Numbered question/answer cards in Markdown, for basic card decks.
pub fn to_anki_qa(ideas: &[Idea], exported_at: DateTime<Utc>) -> String {
    let mut lines = vec![format!(
        "# ideacap export - {}\n",
        exported_at.format("%Y-%m-%d %H:%M")
    )];

    for (n, idea) in ideas.iter().enumerate() {
        lines.push(format!("## Card {}", n + 1));
        lines.push(format!("**Q:** {}", idea.title()));
        lines.push(format!("**A:** {}", idea.content()));
        if !idea.tags().is_empty() {
            lines.push(format!("**Tags:** {}", idea.tags().join(", ")));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

/// HTML-escape text and turn newlines into `<br>`.
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
        .replace('\n', "<br>")
}

/// A TSV field may not contain raw newlines or tabs.
fn escape_tsv(s: &str) -> String {
    s.replace('\n', "<br>").replace('\t', " ")
}

/// Strip unsafe characters, collapse whitespace and truncate.
pub fn sanitize_filename(title: &str, max_chars: usize) -> String {
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(title, "");
    let cleaned = WHITESPACE_RUN.replace_all(cleaned.trim(), " ");
    let truncated: String = cleaned.chars().take(max_chars).collect();
    let truncated = truncated.trim_end();

    if truncated.is_empty() {
        "Untitled".to_string()
    } else {
        truncated.to_string()
    }
}

/// Tags as a YAML flow sequence, quoting tags with separators.
fn format_tags_yaml(tags: &[String]) -> String {
    let items = tags
        .iter()
        .map(|t| {
            if t.contains(' ') || t.contains(',') || t.contains(':') {
                format!("\"{}\"", t)
            } else {
                t.clone()
            }
        })
        .collect::<Vec<_>>();
    format!("[{}]", items.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idea() -> Idea {
        Idea::new(
            Some("Weekend: plan"),
            "Hike then dinner",
            vec!["outdoors".into(), "social plans".into()],
            None,
        )
    }

    #[test]
    fn test_markdown_layout() {
        let md = to_markdown(&idea());
        assert!(md.starts_with("# Weekend: plan\n\nHike then dinner\n\n"));
        assert!(md.contains("**Tags**: `outdoors` `social plans`"));
        assert!(md.contains("*Created: "));
    }

    #[test]
    fn test_obsidian_front_matter() {
        let note = to_obsidian_note(&idea());
        assert!(note.body.starts_with("---\ntags: [outdoors, \"social plans\"]\n"));
        assert!(note.body.contains("source: ideacap\ntype: idea\n---\n\n# Weekend: plan"));
        assert!(!note.body.contains("## Original image"));
        assert!(note.filename.ends_with("-Weekend plan.md"));
    }

    #[test]
    fn test_obsidian_embeds_image() {
        let idea = Idea::new(None, "sketch", vec![], Some(vec![1]));
        let note = to_obsidian_note(&idea);
        assert!(note
            .body
            .ends_with(&format!("![[attachments/{}.jpg]]", idea.id())));
    }

    #[test]
    fn test_obsidian_links_remote_image_after_sync() {
        let mut idea = Idea::new(None, "sketch", vec![], Some(vec![1]));
        let url = "https://cdn.example/idea-images/sketch.jpg";
        let remote_id = idea.wire_id();
        idea.begin_sync();
        idea.mark_synced(remote_id, Some(url.to_string()));
        let note = to_obsidian_note(&idea);
        assert!(!note.body.contains("![[attachments/"));
        assert!(note.body.ends_with(&format!("![]({})", url)));
    }

    #[test]
    fn test_obsidian_empty_tags() {
        let idea = Idea::new(None, "x", vec![], None);
        assert!(to_obsidian_note(&idea).body.contains("tags: []"));
    }

    #[test]
    fn test_daily_note_entry() {
        let entry = to_daily_note_entry(&idea());
        assert!(entry.contains(" - Weekend: plan\n\nHike then dinner\n\n#outdoors #social-plans"));
        assert!(entry.ends_with("---"));
    }

    #[test]
    fn test_anki_card_escapes_html() {
        let idea = Idea::new(
            Some("a < b & \"c\""),
            "line one\nline <two>",
            vec!["math".into()],
            None,
        );
        let card = to_anki_card(&idea);
        assert_eq!(
            card.front,
            "<h2>a &lt; b &amp; &quot;c&quot;</h2><div class='tags'><span class=\"tag\">math</span></div>"
        );
        assert_eq!(card.back, "<div class='content'>line one<br>line &lt;two&gt;</div>");
        assert_eq!(card.tags, vec!["math"]);
    }

    #[test]
    fn test_anki_tsv_layout() {
        let second = Idea::new(Some("Tabs"), "a\tb", vec![], None);
        let tsv = to_anki_tsv(&[idea(), second]);
        let mut lines = tsv.lines();

        assert_eq!(lines.next(), Some("#separator:tab"));
        assert_eq!(lines.next(), Some("#html:true"));
        assert_eq!(lines.next(), Some("#tags column:3"));

        let first: Vec<&str> = lines.next().unwrap().split('\t').collect();
        assert_eq!(first.len(), 3);
        assert!(first[0].starts_with("<h2>Weekend: plan</h2>"));
        assert_eq!(first[1], "<div class='content'>Hike then dinner</div>");
        assert_eq!(first[2], "outdoors social_plans");

        let second: Vec<&str> = lines.next().unwrap().split('\t').collect();
        assert_eq!(second[1], "<div class='content'>a b</div>");
        assert_eq!(second[2], "");
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_anki_qa_numbers_cards() {
        let untagged = Idea::new(Some("Plain"), "no tags here", vec![], None);
        let at = "2026-03-04T05:06:00Z".parse::<DateTime<Utc>>().unwrap();
        let qa = to_anki_qa(&[idea(), untagged], at);

        assert!(qa.starts_with("# ideacap export - 2026-03-04 05:06\n\n## Card 1\n"));
        assert!(qa.contains("**Q:** Weekend: plan\n**A:** Hike then dinner\n**Tags:** outdoors, social plans\n"));
        assert!(qa.ends_with("## Card 2\n**Q:** Plain\n**A:** no tags here\n"));
        assert_eq!(qa.matches("**Tags:**").count(), 1);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("a/b\\c?d", 50), "abcd");
        assert_eq!(sanitize_filename("  many   spaces  ", 50), "many spaces");
        assert_eq!(sanitize_filename("???", 50), "Untitled");
        assert_eq!(sanitize_filename("abcdef", 3), "abc");
    }
}
